//! Mock implementation of ChallengeRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::challenge::Challenge;
use crate::errors::OtpResult;

use super::trait_::ChallengeRepository;

/// In-memory challenge repository for testing
#[derive(Clone)]
pub struct MockChallengeRepository {
    challenges: Arc<RwLock<HashMap<Uuid, Challenge>>>,
}

impl MockChallengeRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            challenges: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored challenges, for assertions
    pub async fn len(&self) -> usize {
        self.challenges.read().await.len()
    }

    /// Whether no challenges are stored
    pub async fn is_empty(&self) -> bool {
        self.challenges.read().await.is_empty()
    }

    /// Fetch a challenge by id regardless of state, for assertions
    pub async fn get(&self, id: Uuid) -> Option<Challenge> {
        self.challenges.read().await.get(&id).cloned()
    }

    fn is_eligible(challenge: &Challenge, phone: &str, now: DateTime<Utc>) -> bool {
        challenge.phone == phone && !challenge.verified && challenge.expires_at > now
    }
}

impl Default for MockChallengeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeRepository for MockChallengeRepository {
    async fn create(&self, challenge: Challenge) -> OtpResult<Challenge> {
        let mut challenges = self.challenges.write().await;
        challenges.insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn find_active(
        &self,
        phone: &str,
        challenge_id: Option<Uuid>,
    ) -> OtpResult<Option<Challenge>> {
        let now = Utc::now();
        let challenges = self.challenges.read().await;
        Ok(challenges
            .values()
            .filter(|c| Self::is_eligible(c, phone, now))
            .filter(|c| challenge_id.map_or(true, |id| c.id == id))
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn count_created_since(&self, phone: &str, since: DateTime<Utc>) -> OtpResult<u64> {
        let challenges = self.challenges.read().await;
        Ok(challenges
            .values()
            .filter(|c| c.phone == phone && c.created_at > since)
            .count() as u64)
    }

    async fn increment_attempts(&self, id: Uuid) -> OtpResult<()> {
        let mut challenges = self.challenges.write().await;
        if let Some(challenge) = challenges.get_mut(&id) {
            challenge.attempts += 1;
        }
        Ok(())
    }

    async fn increment_attempts_for_phone(&self, phone: &str) -> OtpResult<u64> {
        let now = Utc::now();
        let mut challenges = self.challenges.write().await;
        let mut bumped = 0;
        for challenge in challenges.values_mut() {
            if Self::is_eligible(challenge, phone, now) {
                challenge.attempts += 1;
                bumped += 1;
            }
        }
        Ok(bumped)
    }

    async fn mark_verified(&self, id: Uuid, verified_at: DateTime<Utc>) -> OtpResult<bool> {
        // Single write-lock section makes the check-and-set atomic, the
        // same contract the SQL implementation gets from a conditional
        // UPDATE.
        let mut challenges = self.challenges.write().await;
        match challenges.get_mut(&id) {
            Some(challenge) if !challenge.verified => {
                challenge.verified = true;
                challenge.verified_at = Some(verified_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(phone: &str) -> Challenge {
        Challenge::new(phone.to_string(), "LK".to_string())
    }

    #[tokio::test]
    async fn test_create_and_find_active() {
        let repo = MockChallengeRepository::new();
        let created = repo.create(challenge("+94771234567")).await.unwrap();

        let found = repo.find_active("+94771234567", None).await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(created.id));

        let missing = repo.find_active("+94770000000", None).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_active_prefers_most_recent() {
        let repo = MockChallengeRepository::new();
        let mut older = challenge("+94771234567");
        older.created_at = older.created_at - chrono::Duration::seconds(30);
        repo.create(older).await.unwrap();
        let newer = repo.create(challenge("+94771234567")).await.unwrap();

        let found = repo.find_active("+94771234567", None).await.unwrap().unwrap();
        assert_eq!(found.id, newer.id);
    }

    #[tokio::test]
    async fn test_find_active_by_id_skips_other_challenges() {
        let repo = MockChallengeRepository::new();
        let first = repo.create(challenge("+94771234567")).await.unwrap();
        repo.create(challenge("+94771234567")).await.unwrap();

        let found = repo
            .find_active("+94771234567", Some(first.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);

        let missing = repo
            .find_active("+94771234567", Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_mark_verified_flips_exactly_once() {
        let repo = MockChallengeRepository::new();
        let created = repo.create(challenge("+94771234567")).await.unwrap();

        assert!(repo.mark_verified(created.id, Utc::now()).await.unwrap());
        assert!(!repo.mark_verified(created.id, Utc::now()).await.unwrap());

        let stored = repo.get(created.id).await.unwrap();
        assert!(stored.verified);
        assert!(stored.verified_at.is_some());
    }

    #[tokio::test]
    async fn test_verified_challenges_are_not_active() {
        let repo = MockChallengeRepository::new();
        let created = repo.create(challenge("+94771234567")).await.unwrap();
        repo.mark_verified(created.id, Utc::now()).await.unwrap();

        let found = repo.find_active("+94771234567", None).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_increment_attempts_for_phone_skips_ineligible() {
        let repo = MockChallengeRepository::new();
        let active = repo.create(challenge("+94771234567")).await.unwrap();
        let verified = repo.create(challenge("+94771234567")).await.unwrap();
        repo.mark_verified(verified.id, Utc::now()).await.unwrap();
        let expired = repo
            .create(Challenge::new_with_expiration(
                "+94771234567".to_string(),
                "LK".to_string(),
                0,
            ))
            .await
            .unwrap();

        let bumped = repo
            .increment_attempts_for_phone("+94771234567")
            .await
            .unwrap();
        assert_eq!(bumped, 1);
        assert_eq!(repo.get(active.id).await.unwrap().attempts, 1);
        assert_eq!(repo.get(verified.id).await.unwrap().attempts, 0);
        assert_eq!(repo.get(expired.id).await.unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn test_count_created_since() {
        let repo = MockChallengeRepository::new();
        for _ in 0..3 {
            repo.create(challenge("+94771234567")).await.unwrap();
        }
        repo.create(challenge("+94770000000")).await.unwrap();

        let hour_ago = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(
            repo.count_created_since("+94771234567", hour_ago)
                .await
                .unwrap(),
            3
        );

        let future = Utc::now() + chrono::Duration::seconds(5);
        assert_eq!(
            repo.count_created_since("+94771234567", future)
                .await
                .unwrap(),
            0
        );
    }
}
