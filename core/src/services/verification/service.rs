//! Main verification service implementation

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{OtpError, OtpResult};
use crate::phone::{self, mask_phone};
use crate::repositories::ChallengeRepository;

use super::types::VerifyOtpResult;

/// Verifies submitted codes against outstanding challenges.
///
/// Expiry is evaluated lazily at lookup time; no sweep job exists. The
/// consume step is an atomic compare-and-set at the storage layer, so two
/// concurrent calls with the correct code produce exactly one success.
pub struct VerificationService<R: ChallengeRepository> {
    challenges: Arc<R>,
}

impl<R: ChallengeRepository> VerificationService<R> {
    /// Create a new verification service over the challenge store
    pub fn new(challenges: Arc<R>) -> Self {
        Self { challenges }
    }

    /// Verify a one-time passcode.
    ///
    /// # Arguments
    ///
    /// * `phone` - Destination number, raw or canonical (canonicalization
    ///   is idempotent, so either works)
    /// * `code` - The submitted 6-digit code
    /// * `challenge_id` - Narrows verification to one challenge when the
    ///   caller kept the id returned by dispatch
    ///
    /// # Returns
    ///
    /// * `Ok(VerifyOtpResult)` - This call consumed the challenge
    /// * `Err(OtpExpiredOrNotFound)` - Nothing eligible, or another call
    ///   consumed the challenge first
    /// * `Err(MaxAttemptsExceeded)` - Attempts exhausted; a new code is
    ///   required
    /// * `Err(OtpMismatch)` - Wrong code; one attempt was charged
    pub async fn verify_otp(
        &self,
        phone: &str,
        code: &str,
        challenge_id: Option<Uuid>,
    ) -> OtpResult<VerifyOtpResult> {
        let e164 = phone::canonicalize(phone, None)?;

        let challenge = match self.challenges.find_active(&e164, challenge_id).await? {
            Some(challenge) => challenge,
            None => {
                // Burn an attempt on every outstanding challenge so code
                // probing across concurrent challenges is still bounded.
                let outstanding = self
                    .challenges
                    .increment_attempts_for_phone(&e164)
                    .await?;
                tracing::warn!(
                    phone = %mask_phone(&e164),
                    outstanding = outstanding,
                    event = "otp_not_found",
                    "No eligible challenge for verification attempt"
                );
                return Err(OtpError::OtpExpiredOrNotFound);
            }
        };

        if challenge.attempts >= challenge.max_attempts {
            tracing::warn!(
                phone = %mask_phone(&e164),
                challenge_id = %challenge.id,
                event = "max_attempts_exceeded",
                "Verification attempts exhausted for challenge"
            );
            return Err(OtpError::MaxAttemptsExceeded);
        }

        if !challenge.matches(code) {
            self.challenges.increment_attempts(challenge.id).await?;
            let remaining = (challenge.max_attempts - challenge.attempts - 1).max(0);
            tracing::warn!(
                phone = %mask_phone(&e164),
                challenge_id = %challenge.id,
                remaining_attempts = remaining,
                event = "otp_mismatch",
                "Verification code did not match"
            );
            return Err(OtpError::OtpMismatch {
                remaining_attempts: remaining,
            });
        }

        let now = Utc::now();
        if self.challenges.mark_verified(challenge.id, now).await? {
            tracing::info!(
                phone = %mask_phone(&e164),
                challenge_id = %challenge.id,
                event = "otp_verified",
                "Challenge verified"
            );
            Ok(VerifyOtpResult {
                verified: true,
                challenge_id: challenge.id,
                verified_at: now,
            })
        } else {
            // Lost the race: a concurrent call consumed this challenge
            // between our lookup and the conditional update.
            tracing::warn!(
                phone = %mask_phone(&e164),
                challenge_id = %challenge.id,
                event = "otp_already_consumed",
                "Challenge was already verified"
            );
            Err(OtpError::OtpExpiredOrNotFound)
        }
    }
}
