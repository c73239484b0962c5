//! Challenge entity for SMS-based phone verification.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of verification attempts allowed per challenge
pub const MAX_ATTEMPTS: i32 = 3;

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Expiration time for challenges (5 minutes)
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 5;

/// Challenge lifetime reported to callers, in seconds
pub const EXPIRES_IN_SECONDS: u32 = 300;

/// A single issued-OTP record with its own expiry and attempt state.
///
/// Created only by the dispatch service; mutated only by the verification
/// service (attempt increments, the `verified` flip) with expiry evaluated
/// lazily at read time. The `verified: false -> true` transition happens at
/// most once per id, enforced by the storage layer's conditional update
/// rather than by this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique identifier, returned to the caller so a later verify call can
    /// disambiguate concurrent challenges for the same phone
    pub id: Uuid,

    /// Canonical E.164 phone number
    pub phone: String,

    /// The 6-digit verification code
    pub code: String,

    /// 2-letter country code used to resolve the provider at issuance time,
    /// kept for audit even if provider config later changes
    pub country_code: String,

    /// Timestamp when the challenge was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the challenge expires
    pub expires_at: DateTime<Utc>,

    /// Number of failed verification attempts made
    pub attempts: i32,

    /// Maximum allowed attempts
    pub max_attempts: i32,

    /// Whether the challenge has been successfully verified
    pub verified: bool,

    /// When the challenge was verified, if it has been
    pub verified_at: Option<DateTime<Utc>>,

    /// Name of the adapter that actually delivered the message (may differ
    /// from the configured primary if fallback occurred)
    pub provider_used: String,
}

impl Challenge {
    /// Creates a new challenge with a fresh random 6-digit code.
    ///
    /// # Arguments
    ///
    /// * `phone` - Canonical E.164 phone number
    /// * `country_code` - 2-letter country code resolved at issuance
    pub fn new(phone: String, country_code: String) -> Self {
        Self::new_with_expiration(phone, country_code, DEFAULT_EXPIRATION_MINUTES)
    }

    /// Creates a new challenge with a custom expiration time.
    pub fn new_with_expiration(
        phone: String,
        country_code: String,
        expiration_minutes: i64,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            phone,
            code: Self::generate_code(),
            country_code,
            created_at: now,
            expires_at: now + Duration::minutes(expiration_minutes),
            attempts: 0,
            max_attempts: MAX_ATTEMPTS,
            verified: false,
            verified_at: None,
            provider_used: String::new(),
        }
    }

    /// Generates a cryptographically secure random 6-digit code.
    ///
    /// Uses the OS CSPRNG with rejection-sampled uniform range, so every
    /// code in 100000..=999999 is equally likely (no modulo bias, no
    /// leading zeros).
    pub fn generate_code() -> String {
        let code: u32 = OsRng.gen_range(100_000..=999_999);
        code.to_string()
    }

    /// Checks if the challenge has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Checks whether the supplied code matches, in constant time.
    ///
    /// Pure comparison: attempt bookkeeping belongs to the verification
    /// service and the storage layer.
    pub fn matches(&self, input_code: &str) -> bool {
        self.code.len() == input_code.len()
            && constant_time_eq(self.code.as_bytes(), input_code.as_bytes())
    }

    /// Gets the number of remaining verification attempts (0 if exceeded)
    pub fn remaining_attempts(&self) -> i32 {
        (self.max_attempts - self.attempts).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_challenge() {
        let challenge = Challenge::new("+94771234567".to_string(), "LK".to_string());

        assert_eq!(challenge.phone, "+94771234567");
        assert_eq!(challenge.country_code, "LK");
        assert_eq!(challenge.code.len(), CODE_LENGTH);
        assert_eq!(challenge.attempts, 0);
        assert_eq!(challenge.max_attempts, MAX_ATTEMPTS);
        assert!(!challenge.verified);
        assert!(challenge.verified_at.is_none());
        assert!(!challenge.is_expired());
        assert_eq!(
            challenge.expires_at,
            challenge.created_at + Duration::minutes(DEFAULT_EXPIRATION_MINUTES)
        );
    }

    #[test]
    fn test_generate_code_format() {
        for _ in 0..100 {
            let code = Challenge::generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));

            let num: u32 = code.parse().expect("generated code should be numeric");
            assert!((100_000..=999_999).contains(&num));
        }
    }

    #[test]
    fn test_code_uniqueness() {
        let codes: Vec<String> = (0..100).map(|_| Challenge::generate_code()).collect();

        let unique_count = codes.iter().collect::<std::collections::HashSet<_>>().len();
        assert!(unique_count > 1);
    }

    #[test]
    fn test_matches_correct_code() {
        let challenge = Challenge::new("+94771234567".to_string(), "LK".to_string());
        let code = challenge.code.clone();

        assert!(challenge.matches(&code));
        assert!(!challenge.matches("000000"));
        assert!(!challenge.matches(""));
        assert!(!challenge.matches("12345"));
    }

    #[test]
    fn test_expiration() {
        let challenge =
            Challenge::new_with_expiration("+94771234567".to_string(), "LK".to_string(), 0);

        std::thread::sleep(std::time::Duration::from_millis(10));

        assert!(challenge.is_expired());
    }

    #[test]
    fn test_remaining_attempts() {
        let mut challenge = Challenge::new("+94771234567".to_string(), "LK".to_string());

        assert_eq!(challenge.remaining_attempts(), MAX_ATTEMPTS);

        challenge.attempts = 2;
        assert_eq!(challenge.remaining_attempts(), 1);

        challenge.attempts = MAX_ATTEMPTS + 1;
        assert_eq!(challenge.remaining_attempts(), 0);
    }

    #[test]
    fn test_serialization_round_trip() {
        let challenge = Challenge::new("+94771234567".to_string(), "LK".to_string());

        let json = serde_json::to_string(&challenge).unwrap();
        let deserialized: Challenge = serde_json::from_str(&json).unwrap();

        assert_eq!(challenge, deserialized);
    }
}
