//! Main dispatch service implementation

use std::sync::Arc;

use crate::domain::entities::challenge::{Challenge, EXPIRES_IN_SECONDS};
use crate::domain::entities::provider_config::ProviderConfig;
use crate::errors::{OtpError, OtpResult};
use crate::phone::{self, mask_phone};
use crate::providers::{ProviderFactory, SmsProvider, SmsReceipt};
use crate::repositories::{ChallengeRepository, ProviderConfigRepository};
use crate::services::rate_limit::{RateLimitConfig, RateLimiter};
use crate::services::registry::ProviderRegistry;

use super::config::DispatchConfig;
use super::types::SendOtpResult;

/// Orchestrates challenge issuance: rate limiting, normalization, provider
/// resolution, delivery with one fallback attempt, and persistence.
///
/// Exactly one challenge row is created per successful call; none is
/// created when normalization, rate limiting, or config resolution fail
/// before an adapter is invoked. Primary and fallback sends run
/// sequentially, never in parallel, so a flaky primary cannot cause double
/// delivery or double billing.
pub struct DispatchService<R, P, F>
where
    R: ChallengeRepository,
    P: ProviderConfigRepository,
    F: ProviderFactory,
{
    /// Challenge persistence
    challenges: Arc<R>,
    /// Per-country provider resolution
    registry: ProviderRegistry<P>,
    /// Adapter construction
    provider_factory: Arc<F>,
    /// Issuance rate limiting
    rate_limiter: RateLimiter<R>,
    /// Service configuration
    config: DispatchConfig,
}

impl<R, P, F> DispatchService<R, P, F>
where
    R: ChallengeRepository,
    P: ProviderConfigRepository,
    F: ProviderFactory,
{
    /// Create a new dispatch service
    ///
    /// # Arguments
    ///
    /// * `challenges` - Challenge repository
    /// * `provider_configs` - Provider configuration repository
    /// * `provider_factory` - Adapter factory
    /// * `config` - Issuance configuration
    /// * `rate_limit` - Rolling-window limit configuration
    pub fn new(
        challenges: Arc<R>,
        provider_configs: Arc<P>,
        provider_factory: Arc<F>,
        config: DispatchConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(challenges.clone(), rate_limit),
            registry: ProviderRegistry::new(provider_configs),
            challenges,
            provider_factory,
            config,
        }
    }

    /// Issue and deliver a one-time passcode.
    ///
    /// # Arguments
    ///
    /// * `phone` - Destination number, raw or canonical
    /// * `country_hint` - Optional 2-letter country code used when the
    ///   number carries no recognizable calling code
    ///
    /// # Returns
    ///
    /// * `Ok(SendOtpResult)` - Challenge id, expiry, and delivering provider
    /// * `Err(OtpError)` - A step of the send pipeline failed; no
    ///   challenge row exists unless delivery succeeded
    pub async fn send_otp(
        &self,
        phone: &str,
        country_hint: Option<&str>,
    ) -> OtpResult<SendOtpResult> {
        let e164 = phone::canonicalize(phone, country_hint)?;

        // The window counts stored challenges, which hold canonical
        // numbers, so the check runs on the canonical form.
        self.rate_limiter.check(&e164).await?;

        let country = self.resolve_country(&e164, country_hint);
        let provider_config = self.registry.resolve(&country).await?;

        let mut challenge = Challenge::new_with_expiration(
            e164.clone(),
            country.clone(),
            self.config.code_expiration_minutes,
        );
        challenge.max_attempts = self.config.max_attempts;

        tracing::info!(
            phone = %mask_phone(&e164),
            country = %country,
            challenge_id = %challenge.id,
            event = "otp_generated",
            "Generated new verification challenge"
        );

        let message = self.config.message_template.replace("{code}", &challenge.code);
        let (receipt, provider_used) = self
            .deliver(&provider_config, &e164, &message)
            .await?;

        challenge.provider_used = provider_used.clone();

        tracing::info!(
            phone = %mask_phone(&e164),
            provider = %provider_used,
            message_id = %receipt.message_id,
            cost_estimate = receipt.cost_estimate,
            challenge_id = %challenge.id,
            event = "otp_sent",
            "Verification code delivered"
        );

        let challenge = self.challenges.create(challenge).await?;

        Ok(SendOtpResult {
            challenge_id: challenge.id,
            expires_in_seconds: EXPIRES_IN_SECONDS,
            provider: provider_used,
        })
    }

    /// Country used for provider resolution and audit: the number's own
    /// calling code wins, then the caller's hint, then the default market.
    fn resolve_country(&self, e164: &str, country_hint: Option<&str>) -> String {
        phone::country_for_e164(e164)
            .map(str::to_string)
            .or_else(|| {
                country_hint
                    .map(|hint| hint.trim().to_ascii_uppercase())
                    .filter(|hint| !hint.is_empty())
            })
            .unwrap_or_else(|| phone::DEFAULT_COUNTRY.to_string())
    }

    /// Send through the configured primary, falling back once when a
    /// fallback provider is configured. Adapter errors stay server-side.
    async fn deliver(
        &self,
        config: &ProviderConfig,
        e164: &str,
        message: &str,
    ) -> OtpResult<(SmsReceipt, String)> {
        match self
            .try_provider(&config.provider_name, &config.settings, e164, message)
            .await
        {
            Ok(receipt) => Ok((receipt, config.provider_name.clone())),
            Err(primary_error) => {
                tracing::error!(
                    phone = %mask_phone(e164),
                    provider = %config.provider_name,
                    error = %primary_error,
                    event = "provider_send_failed",
                    "Primary SMS provider failed"
                );

                let fallback = config
                    .fallback_provider_name
                    .as_ref()
                    .zip(config.fallback_settings.as_ref());

                let Some((fallback_name, fallback_settings)) = fallback else {
                    return Err(OtpError::ProviderUnavailable {
                        provider: config.provider_name.clone(),
                    });
                };

                tracing::warn!(
                    phone = %mask_phone(e164),
                    provider = %fallback_name,
                    event = "provider_fallback",
                    "Retrying send via fallback provider"
                );

                match self
                    .try_provider(fallback_name, fallback_settings, e164, message)
                    .await
                {
                    Ok(receipt) => Ok((receipt, fallback_name.clone())),
                    Err(fallback_error) => {
                        tracing::error!(
                            phone = %mask_phone(e164),
                            provider = %fallback_name,
                            error = %fallback_error,
                            event = "provider_send_failed",
                            "Fallback SMS provider also failed"
                        );
                        Err(OtpError::ProviderUnavailable {
                            provider: fallback_name.clone(),
                        })
                    }
                }
            }
        }
    }

    /// Construct one adapter and attempt a single send. Construction
    /// failures (unknown name, malformed settings) count as send failures
    /// so a configured fallback still gets its chance.
    async fn try_provider(
        &self,
        provider_name: &str,
        settings: &serde_json::Value,
        e164: &str,
        message: &str,
    ) -> Result<SmsReceipt, String> {
        let provider = self.provider_factory.create(provider_name, settings).await?;
        provider.send_sms(e164, message).await
    }
}
