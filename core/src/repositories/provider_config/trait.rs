//! Provider configuration repository trait.
//!
//! Read-only from the engine's perspective: rows are written by the
//! external admin-configuration collaborator.

use async_trait::async_trait;

use crate::domain::entities::provider_config::ProviderConfig;
use crate::errors::OtpResult;

/// Repository trait for reading per-country provider configuration
#[async_trait]
pub trait ProviderConfigRepository: Send + Sync {
    /// Find the active configuration for a country.
    ///
    /// Exclusivity of the active row is a write-side convention, not a
    /// constraint; when several rows are active the most recently updated
    /// one wins, and zero active rows is simply `None`.
    async fn find_active(&self, country_code: &str) -> OtpResult<Option<ProviderConfig>>;
}
