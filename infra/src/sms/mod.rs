//! SMS Gateway Adapters
//!
//! One adapter per external gateway, each implementing the core
//! `SmsProvider` seam, plus the factory that builds adapters from
//! provider configuration rows.
//!
//! Adapters own their gateway's quirks (OAuth sessions, free-text success
//! sniffing, multiple phone formats) but never retry beyond their own
//! documented contract; falling back to another provider is the dispatch
//! service's job.

use async_trait::async_trait;

use otp_core::providers::{ProviderFactory, SmsProvider};

pub mod custom_http;
pub mod dialog;
pub mod vonage;

// Twilio SMS adapter (feature-gated)
#[cfg(feature = "twilio-sms")]
pub mod twilio;

// AWS SNS SMS adapter (feature-gated)
#[cfg(feature = "aws-sns")]
pub mod sns;

// Re-export commonly used types
pub use custom_http::{CustomHttpConfig, CustomHttpSmsService};
pub use dialog::{DialogConfig, DialogSmsService};
pub use vonage::{VonageConfig, VonageSmsService};

#[cfg(feature = "twilio-sms")]
pub use twilio::{TwilioConfig, TwilioSmsService};

#[cfg(feature = "aws-sns")]
pub use sns::{SnsConfig, SnsSmsService};

#[cfg(test)]
mod tests;

/// Builds gateway adapters from provider configuration rows.
///
/// The mapping from provider name to adapter is a closed match: unknown
/// names are construction errors, never silently swapped for a default.
pub struct GatewayProviderFactory;

impl GatewayProviderFactory {
    /// Create a new factory
    pub fn new() -> Self {
        Self
    }
}

impl Default for GatewayProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderFactory for GatewayProviderFactory {
    async fn create(
        &self,
        provider_name: &str,
        settings: &serde_json::Value,
    ) -> Result<Box<dyn SmsProvider>, String> {
        match provider_name {
            #[cfg(feature = "twilio-sms")]
            "twilio" => {
                let config: TwilioConfig = serde_json::from_value(settings.clone())
                    .map_err(|e| format!("invalid twilio settings: {e}"))?;
                let service = TwilioSmsService::new(config).map_err(|e| e.to_string())?;
                Ok(Box::new(service))
            }
            #[cfg(feature = "aws-sns")]
            "sns" | "aws-sns" => {
                let config: SnsConfig = serde_json::from_value(settings.clone())
                    .map_err(|e| format!("invalid sns settings: {e}"))?;
                let service = SnsSmsService::new(config).await.map_err(|e| e.to_string())?;
                Ok(Box::new(service))
            }
            "vonage" => {
                let config: VonageConfig = serde_json::from_value(settings.clone())
                    .map_err(|e| format!("invalid vonage settings: {e}"))?;
                let service = VonageSmsService::new(config).map_err(|e| e.to_string())?;
                Ok(Box::new(service))
            }
            "custom" | "local" => {
                let config: CustomHttpConfig = serde_json::from_value(settings.clone())
                    .map_err(|e| format!("invalid custom gateway settings: {e}"))?;
                let service = CustomHttpSmsService::new(config).map_err(|e| e.to_string())?;
                Ok(Box::new(service))
            }
            "dialog" | "esms" => {
                let config: DialogConfig = serde_json::from_value(settings.clone())
                    .map_err(|e| format!("invalid dialog settings: {e}"))?;
                let service = DialogSmsService::new(config).map_err(|e| e.to_string())?;
                Ok(Box::new(service))
            }
            other => Err(format!("unknown SMS provider: {other}")),
        }
    }
}

/// Default per-call timeout for gateway requests, in seconds
pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
