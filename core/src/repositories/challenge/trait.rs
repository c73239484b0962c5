//! Challenge repository trait defining the persistence contract for
//! challenge records.
//!
//! The trait is async-first and keeps the one transactional guarantee the
//! engine needs at the storage layer: `mark_verified` is an atomic
//! compare-and-set on the `verified` flag, so concurrent verify calls with
//! the correct code cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::challenge::Challenge;
use crate::errors::OtpResult;

/// Repository trait for challenge persistence operations
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Persist a newly issued challenge
    async fn create(&self, challenge: Challenge) -> OtpResult<Challenge>;

    /// Find the most recent unexpired, unverified challenge for a phone.
    ///
    /// # Arguments
    /// * `phone` - Canonical E.164 phone number
    /// * `challenge_id` - Narrows the lookup to one challenge when the
    ///   caller holds the id from dispatch
    ///
    /// # Returns
    /// * `Ok(Some(Challenge))` - An eligible challenge exists
    /// * `Ok(None)` - Nothing outstanding for this phone (or id)
    async fn find_active(
        &self,
        phone: &str,
        challenge_id: Option<Uuid>,
    ) -> OtpResult<Option<Challenge>>;

    /// Count challenges created for a phone since the given instant.
    ///
    /// Backs the rolling rate-limit window; counts every issuance
    /// regardless of verification state.
    async fn count_created_since(&self, phone: &str, since: DateTime<Utc>) -> OtpResult<u64>;

    /// Increment the attempt counter on one challenge
    async fn increment_attempts(&self, id: Uuid) -> OtpResult<()>;

    /// Increment the attempt counter on every unexpired, unverified
    /// challenge for a phone.
    ///
    /// Used when a verify call matches no eligible challenge, so probing
    /// across concurrent outstanding challenges still burns attempts.
    ///
    /// # Returns
    /// Number of challenges that were incremented
    async fn increment_attempts_for_phone(&self, phone: &str) -> OtpResult<u64>;

    /// Atomically flip `verified` from false to true.
    ///
    /// # Returns
    /// * `Ok(true)` - This call won the transition; `verified_at` is set
    /// * `Ok(false)` - The challenge was already verified (or missing);
    ///   nothing was mutated
    async fn mark_verified(&self, id: Uuid, verified_at: DateTime<Utc>) -> OtpResult<bool>;
}
