//! Provider configuration entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SMS provider configuration for one country.
///
/// Written only by the external admin-configuration collaborator; this core
/// reads it. Exclusivity (one active row per country) is a convention kept
/// by the write side deactivating siblings, not a database constraint, so
/// readers must tolerate zero or multiple active rows by taking the most
/// recently updated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 2-letter country code this config applies to
    pub country_code: String,

    /// Adapter name, e.g. "twilio", "sns", "vonage", "custom", "dialog"
    pub provider_name: String,

    /// Opaque provider-specific settings blob, deserialized by the matching
    /// adapter's config struct
    pub settings: serde_json::Value,

    /// Whether this row is the active configuration for the country
    pub is_active: bool,

    /// Secondary adapter tried once when the primary send fails
    pub fallback_provider_name: Option<String>,

    /// Settings blob for the fallback adapter
    pub fallback_settings: Option<serde_json::Value>,

    /// Last admin update, used to break ties between multiple active rows
    pub updated_at: DateTime<Utc>,
}

impl ProviderConfig {
    /// Create a config with no fallback
    pub fn new(
        country_code: impl Into<String>,
        provider_name: impl Into<String>,
        settings: serde_json::Value,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            provider_name: provider_name.into(),
            settings,
            is_active: true,
            fallback_provider_name: None,
            fallback_settings: None,
            updated_at: Utc::now(),
        }
    }

    /// Attach a fallback provider
    pub fn with_fallback(
        mut self,
        provider_name: impl Into<String>,
        settings: serde_json::Value,
    ) -> Self {
        self.fallback_provider_name = Some(provider_name.into());
        self.fallback_settings = Some(settings);
        self
    }

    /// Whether a fallback provider is configured
    pub fn has_fallback(&self) -> bool {
        self.fallback_provider_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_config_is_active_without_fallback() {
        let config = ProviderConfig::new("LK", "dialog", json!({"mode": "oauth"}));

        assert_eq!(config.country_code, "LK");
        assert_eq!(config.provider_name, "dialog");
        assert!(config.is_active);
        assert!(!config.has_fallback());
    }

    #[test]
    fn test_with_fallback() {
        let config = ProviderConfig::new("LK", "dialog", json!({}))
            .with_fallback("twilio", json!({"account_sid": "AC123"}));

        assert!(config.has_fallback());
        assert_eq!(config.fallback_provider_name.as_deref(), Some("twilio"));
        assert!(config.fallback_settings.is_some());
    }
}
