//! Types for dispatch service results

use uuid::Uuid;

/// Result of a successful SendOTP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOtpResult {
    /// Identifier of the persisted challenge, echoed back on verify
    pub challenge_id: Uuid,
    /// Seconds until the challenge expires (fixed at issuance)
    pub expires_in_seconds: u32,
    /// Name of the adapter that delivered the message
    pub provider: String,
}
