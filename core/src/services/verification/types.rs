//! Types for verification service results

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of a successful VerifyOTP call.
///
/// Failures are errors, so `verified` is always true here; the flag exists
/// for the route layer's response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOtpResult {
    /// Whether verification succeeded
    pub verified: bool,
    /// The challenge that was consumed
    pub challenge_id: Uuid,
    /// When the verified flag was set
    pub verified_at: DateTime<Utc>,
}
