//! MySQL implementation of the ProviderConfigRepository trait.
//!
//! Provider configuration is written by the admin tooling and read-only
//! here. Settings blobs are stored as JSON text and parsed on read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};

use otp_core::domain::entities::provider_config::ProviderConfig;
use otp_core::errors::{OtpError, OtpResult};
use otp_core::repositories::ProviderConfigRepository;

/// MySQL implementation of ProviderConfigRepository
pub struct MySqlProviderConfigRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlProviderConfigRepository {
    /// Create a new MySQL provider configuration repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn storage_error(context: &str, e: impl std::fmt::Display) -> OtpError {
        OtpError::Storage {
            message: format!("{context}: {e}"),
        }
    }

    fn parse_settings(raw: &str) -> OtpResult<serde_json::Value> {
        serde_json::from_str(raw)
            .map_err(|e| Self::storage_error("Invalid provider settings JSON", e))
    }

    /// Convert a database row to a ProviderConfig entity
    fn row_to_config(row: &sqlx::mysql::MySqlRow) -> OtpResult<ProviderConfig> {
        let settings: String = row
            .try_get("config")
            .map_err(|e| Self::storage_error("Failed to get config", e))?;
        let fallback_settings: Option<String> = row
            .try_get("fallback_config")
            .map_err(|e| Self::storage_error("Failed to get fallback_config", e))?;

        Ok(ProviderConfig {
            country_code: row
                .try_get("country_code")
                .map_err(|e| Self::storage_error("Failed to get country_code", e))?,
            provider_name: row
                .try_get("provider_name")
                .map_err(|e| Self::storage_error("Failed to get provider_name", e))?,
            settings: Self::parse_settings(&settings)?,
            is_active: row
                .try_get("is_active")
                .map_err(|e| Self::storage_error("Failed to get is_active", e))?,
            fallback_provider_name: row
                .try_get("fallback_provider_name")
                .map_err(|e| Self::storage_error("Failed to get fallback_provider_name", e))?,
            fallback_settings: fallback_settings
                .as_deref()
                .map(Self::parse_settings)
                .transpose()?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| Self::storage_error("Failed to get updated_at", e))?,
        })
    }
}

#[async_trait]
impl ProviderConfigRepository for MySqlProviderConfigRepository {
    async fn find_active(&self, country_code: &str) -> OtpResult<Option<ProviderConfig>> {
        // Exclusivity of the active row is an admin-side convention, so
        // multiple active rows are tolerated and the newest update wins.
        let query = r#"
            SELECT country_code, provider_name, config, is_active,
                   fallback_provider_name, fallback_config, updated_at
            FROM provider_configs
            WHERE country_code = ? AND is_active = TRUE
            ORDER BY updated_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(country_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    country = country_code,
                    error = %e,
                    "Failed to look up provider configuration"
                );
                Self::storage_error("Failed to look up provider configuration", e)
            })?;

        row.as_ref().map(Self::row_to_config).transpose()
    }
}
