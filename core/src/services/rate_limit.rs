//! Rolling-window rate limiting for challenge issuance.
//!
//! The window is a count query against the challenge store scoped by phone
//! and time. No counter state exists to drift; the trade is a little query
//! cost per send, and the limit is advisory rather than a hard
//! mutual-exclusion gate (concurrent sends are not serialized).

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::errors::{OtpError, OtpResult};
use crate::phone::mask_phone;
use crate::repositories::ChallengeRepository;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum challenges per phone per window
    pub max_requests_per_window: u64,
    /// Window length in minutes
    pub window_minutes: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 10,
            window_minutes: 60,
        }
    }
}

/// Per-phone issuance rate limiter backed by the challenge store
pub struct RateLimiter<R: ChallengeRepository> {
    repository: Arc<R>,
    config: RateLimitConfig,
}

impl<R: ChallengeRepository> RateLimiter<R> {
    /// Create a rate limiter over the given challenge store
    pub fn new(repository: Arc<R>, config: RateLimitConfig) -> Self {
        Self { repository, config }
    }

    /// Fail with `RateLimitExceeded` if the phone has already requested the
    /// maximum number of challenges inside the trailing window.
    pub async fn check(&self, phone: &str) -> OtpResult<()> {
        let since = Utc::now() - Duration::minutes(self.config.window_minutes);
        let count = self.repository.count_created_since(phone, since).await?;

        if count >= self.config.max_requests_per_window {
            tracing::warn!(
                phone = %mask_phone(phone),
                count = count,
                window_minutes = self.config.window_minutes,
                event = "rate_limit_exceeded",
                "Challenge request rate limit exceeded"
            );
            return Err(OtpError::RateLimitExceeded {
                minutes: self.config.window_minutes as u32,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::challenge::Challenge;
    use crate::repositories::MockChallengeRepository;

    const PHONE: &str = "+94771234567";

    async fn seed(repo: &MockChallengeRepository, count: usize) {
        for _ in 0..count {
            repo.create(Challenge::new(PHONE.to_string(), "LK".to_string()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_under_limit_passes() {
        let repo = Arc::new(MockChallengeRepository::new());
        seed(&repo, 9).await;

        let limiter = RateLimiter::new(repo, RateLimitConfig::default());
        assert!(limiter.check(PHONE).await.is_ok());
    }

    #[tokio::test]
    async fn test_at_limit_fails() {
        let repo = Arc::new(MockChallengeRepository::new());
        seed(&repo, 10).await;

        let limiter = RateLimiter::new(repo, RateLimitConfig::default());
        assert!(matches!(
            limiter.check(PHONE).await,
            Err(OtpError::RateLimitExceeded { minutes: 60 })
        ));
    }

    #[tokio::test]
    async fn test_other_phones_do_not_count() {
        let repo = Arc::new(MockChallengeRepository::new());
        seed(&repo, 10).await;

        let limiter = RateLimiter::new(repo, RateLimitConfig::default());
        assert!(limiter.check("+94770000000").await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_window() {
        let repo = Arc::new(MockChallengeRepository::new());
        seed(&repo, 2).await;

        let limiter = RateLimiter::new(
            repo,
            RateLimitConfig {
                max_requests_per_window: 2,
                window_minutes: 30,
            },
        );
        assert!(matches!(
            limiter.check(PHONE).await,
            Err(OtpError::RateLimitExceeded { minutes: 30 })
        ));
    }
}
