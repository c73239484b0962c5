//! Mock implementation of ProviderConfigRepository for testing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::provider_config::ProviderConfig;
use crate::errors::OtpResult;

use super::trait_::ProviderConfigRepository;

/// In-memory provider configuration repository for testing
#[derive(Clone)]
pub struct MockProviderConfigRepository {
    configs: Arc<RwLock<Vec<ProviderConfig>>>,
}

impl MockProviderConfigRepository {
    /// Create an empty mock repository
    pub fn new() -> Self {
        Self {
            configs: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a mock repository seeded with configuration rows
    pub fn with_configs(configs: Vec<ProviderConfig>) -> Self {
        Self {
            configs: Arc::new(RwLock::new(configs)),
        }
    }

    /// Add a configuration row
    pub async fn insert(&self, config: ProviderConfig) {
        self.configs.write().await.push(config);
    }
}

impl Default for MockProviderConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderConfigRepository for MockProviderConfigRepository {
    async fn find_active(&self, country_code: &str) -> OtpResult<Option<ProviderConfig>> {
        let configs = self.configs.read().await;
        Ok(configs
            .iter()
            .filter(|c| c.country_code == country_code && c.is_active)
            .max_by_key(|c| c.updated_at)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_find_active_ignores_inactive_rows() {
        let mut inactive = ProviderConfig::new("LK", "vonage", json!({}));
        inactive.is_active = false;
        let repo = MockProviderConfigRepository::with_configs(vec![
            inactive,
            ProviderConfig::new("LK", "dialog", json!({})),
        ]);

        let found = repo.find_active("LK").await.unwrap().unwrap();
        assert_eq!(found.provider_name, "dialog");
    }

    #[tokio::test]
    async fn test_find_active_prefers_most_recently_updated() {
        let mut stale = ProviderConfig::new("LK", "vonage", json!({}));
        stale.updated_at = Utc::now() - Duration::hours(2);
        let fresh = ProviderConfig::new("LK", "dialog", json!({}));
        let repo = MockProviderConfigRepository::with_configs(vec![stale, fresh]);

        let found = repo.find_active("LK").await.unwrap().unwrap();
        assert_eq!(found.provider_name, "dialog");
    }

    #[tokio::test]
    async fn test_find_active_none_for_unconfigured_country() {
        let repo = MockProviderConfigRepository::new();
        assert!(repo.find_active("US").await.unwrap().is_none());
    }
}
