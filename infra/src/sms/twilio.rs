//! Twilio SMS Adapter
//!
//! Token-bearer HTTP gateway: one synchronous POST per send with static
//! credentials. Errors propagate directly; there is no internal retry.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use twilio::{Client, OutboundMessage};

use otp_core::phone::mask_phone;
use otp_core::providers::{SmsProvider, SmsReceipt};

use crate::InfrastructureError;

use super::default_request_timeout_secs;

/// Twilio adapter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    pub auth_token: String,
    /// From phone number (must be a Twilio phone number, E.164)
    pub from_number: String,
    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TwilioConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| InfrastructureError::Config("TWILIO_ACCOUNT_SID not set".to_string()))?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| InfrastructureError::Config("TWILIO_AUTH_TOKEN not set".to_string()))?;
        let from_number = std::env::var("TWILIO_FROM_NUMBER")
            .map_err(|_| InfrastructureError::Config("TWILIO_FROM_NUMBER not set".to_string()))?;

        if !from_number.starts_with('+') {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        Ok(Self {
            account_sid,
            auth_token,
            from_number,
            request_timeout_secs: std::env::var("TWILIO_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_request_timeout_secs),
        })
    }
}

/// Twilio SMS adapter
pub struct TwilioSmsService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioSmsService {
    /// Create a new Twilio adapter
    pub fn new(config: TwilioConfig) -> Result<Self, InfrastructureError> {
        if !config.from_number.starts_with('+') {
            return Err(InfrastructureError::Config(
                "Twilio from_number must be in E.164 format".to_string(),
            ));
        }

        let client = Client::new(&config.account_sid, &config.auth_token);

        debug!(
            from = %mask_phone(&config.from_number),
            "Twilio SMS adapter initialized"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(TwilioConfig::from_env()?)
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsService {
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        debug!(
            phone = %mask_phone(phone),
            "Sending SMS via Twilio"
        );

        let outbound = OutboundMessage::new(&self.config.from_number, phone, message);
        let timeout = Duration::from_secs(self.config.request_timeout_secs);

        let response = tokio::time::timeout(timeout, self.client.send_message(outbound))
            .await
            .map_err(|_| {
                format!(
                    "Twilio request timed out after {}s",
                    self.config.request_timeout_secs
                )
            })?
            .map_err(|e| format!("Twilio send failed: {e}"))?;

        info!(
            phone = %mask_phone(phone),
            sid = %response.sid,
            "SMS accepted by Twilio"
        );

        Ok(SmsReceipt::new(response.sid))
    }

    fn provider_name(&self) -> &str {
        "twilio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_from_settings_blob() {
        let settings = json!({
            "account_sid": "ACtest",
            "auth_token": "token",
            "from_number": "+15551234567"
        });

        let config: TwilioConfig = serde_json::from_value(settings).unwrap();
        assert_eq!(config.account_sid, "ACtest");
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_new_rejects_non_e164_from_number() {
        let config = TwilioConfig {
            account_sid: "ACtest".to_string(),
            auth_token: "token".to_string(),
            from_number: "15551234567".to_string(),
            request_timeout_secs: 15,
        };

        let result = TwilioSmsService::new(config);
        assert!(result.is_err());
        assert!(result.err().unwrap().to_string().contains("E.164"));
    }
}
