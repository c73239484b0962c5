//! Per-country provider resolution.

use std::sync::Arc;

use crate::domain::entities::provider_config::ProviderConfig;
use crate::errors::{OtpError, OtpResult};
use crate::phone;
use crate::repositories::ProviderConfigRepository;

/// Resolves which provider adapter is active for a country, and what its
/// fallback is.
///
/// Country codes and phone calling codes are interchangeable inputs:
/// `LK`, `lk`, `94`, and `+94` all resolve the same row. There is no
/// default provider; a country without an active row is a fatal,
/// user-visible `ConfigNotFound` so operators can see exactly which market
/// is unconfigured.
pub struct ProviderRegistry<P: ProviderConfigRepository> {
    repository: Arc<P>,
}

impl<P: ProviderConfigRepository> ProviderRegistry<P> {
    /// Create a registry over the given configuration store
    pub fn new(repository: Arc<P>) -> Self {
        Self { repository }
    }

    /// Resolve the active provider configuration for a country
    pub async fn resolve(&self, country: &str) -> OtpResult<ProviderConfig> {
        let country_code = Self::normalize_country(country);

        match self.repository.find_active(&country_code).await? {
            Some(config) => {
                tracing::debug!(
                    country = %country_code,
                    provider = %config.provider_name,
                    fallback = config.fallback_provider_name.as_deref().unwrap_or("none"),
                    event = "provider_resolved",
                    "Resolved active SMS provider"
                );
                Ok(config)
            }
            None => {
                tracing::error!(
                    country = %country_code,
                    event = "provider_config_missing",
                    "No active SMS provider configured for country"
                );
                Err(OtpError::ConfigNotFound {
                    country: country_code,
                })
            }
        }
    }

    /// Normalize a country or calling-code input to an uppercase 2-letter
    /// country code
    fn normalize_country(input: &str) -> String {
        let trimmed = input.trim();
        phone::country_for_calling_code(trimmed)
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockProviderConfigRepository;
    use serde_json::json;

    fn registry_with_lk() -> ProviderRegistry<MockProviderConfigRepository> {
        let repo = MockProviderConfigRepository::with_configs(vec![ProviderConfig::new(
            "LK",
            "dialog",
            json!({"mode": "oauth"}),
        )]);
        ProviderRegistry::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_resolve_by_country_code() {
        let registry = registry_with_lk();

        let config = registry.resolve("LK").await.unwrap();
        assert_eq!(config.provider_name, "dialog");

        let config = registry.resolve("lk").await.unwrap();
        assert_eq!(config.provider_name, "dialog");
    }

    #[tokio::test]
    async fn test_resolve_by_calling_code() {
        let registry = registry_with_lk();

        assert!(registry.resolve("94").await.is_ok());
        assert!(registry.resolve("+94").await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_unconfigured_country_fails() {
        let registry = registry_with_lk();

        let err = registry.resolve("US").await.unwrap_err();
        assert!(matches!(err, OtpError::ConfigNotFound { country } if country == "US"));
    }

    #[tokio::test]
    async fn test_resolve_picks_most_recently_updated_active_row() {
        let mut stale = ProviderConfig::new("LK", "vonage", json!({}));
        stale.updated_at = chrono::Utc::now() - chrono::Duration::days(1);
        let repo = MockProviderConfigRepository::with_configs(vec![
            stale,
            ProviderConfig::new("LK", "dialog", json!({})),
        ]);
        let registry = ProviderRegistry::new(Arc::new(repo));

        let config = registry.resolve("LK").await.unwrap();
        assert_eq!(config.provider_name, "dialog");
    }
}
