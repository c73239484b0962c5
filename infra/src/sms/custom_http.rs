//! Configurable Local/Dev Gateway Adapter
//!
//! Two modes:
//! - `log`: no delivery at all, the message is written to the log and the
//!   send always succeeds. Used for development and testing.
//! - `http`: a generic HTTP call shaped by configured parameter names,
//!   enough to drive white-label or local carriers that don't warrant a
//!   bespoke adapter.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use otp_core::phone::mask_phone;
use otp_core::providers::{SmsProvider, SmsReceipt};

use crate::InfrastructureError;

use super::default_request_timeout_secs;

fn default_to_param() -> String {
    "to".to_string()
}

fn default_message_param() -> String {
    "message".to_string()
}

fn default_method() -> String {
    "get".to_string()
}

/// Operating mode of the custom gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomMode {
    /// Log the message and succeed without delivering
    Log,
    /// Perform a generic HTTP call against `base_url`
    Http,
}

/// Custom gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CustomHttpConfig {
    /// Operating mode
    pub mode: CustomMode,
    /// Endpoint URL, required in `http` mode
    #[serde(default)]
    pub base_url: Option<String>,
    /// HTTP method: "get" or "post" (form-encoded)
    #[serde(default = "default_method")]
    pub method: String,
    /// Query/form parameter carrying the destination number
    #[serde(default = "default_to_param")]
    pub to_param: String,
    /// Query/form parameter carrying the message body
    #[serde(default = "default_message_param")]
    pub message_param: String,
    /// Static parameters appended to every request (API keys etc.)
    #[serde(default)]
    pub extra_params: HashMap<String, String>,
    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Configurable local/dev gateway adapter
pub struct CustomHttpSmsService {
    client: reqwest::Client,
    config: CustomHttpConfig,
}

impl CustomHttpSmsService {
    /// Create a new custom gateway adapter
    pub fn new(config: CustomHttpConfig) -> Result<Self, InfrastructureError> {
        if config.mode == CustomMode::Http && config.base_url.is_none() {
            return Err(InfrastructureError::Config(
                "custom gateway in http mode requires base_url".to_string(),
            ));
        }

        let method = config.method.to_ascii_lowercase();
        if method != "get" && method != "post" {
            return Err(InfrastructureError::Config(format!(
                "custom gateway method must be get or post, got {}",
                config.method
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    async fn send_http(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .ok_or_else(|| "custom gateway base_url missing".to_string())?;

        let mut params: Vec<(&str, &str)> = vec![
            (self.config.to_param.as_str(), phone),
            (self.config.message_param.as_str(), message),
        ];
        for (key, value) in &self.config.extra_params {
            params.push((key.as_str(), value.as_str()));
        }

        let request = if self.config.method.eq_ignore_ascii_case("post") {
            self.client.post(base_url).form(&params)
        } else {
            self.client.get(base_url).query(&params)
        };

        let response = request
            .send()
            .await
            .map_err(|e| format!("custom gateway request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %body, "Custom gateway rejected send");
            return Err(format!("custom gateway HTTP error {status}"));
        }

        Ok(SmsReceipt::new(format!("custom-{}", Uuid::new_v4())))
    }
}

#[async_trait]
impl SmsProvider for CustomHttpSmsService {
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        match self.config.mode {
            CustomMode::Log => {
                info!(
                    phone = %mask_phone(phone),
                    message = %message,
                    "SMS (log-only mode, not delivered)"
                );
                Ok(SmsReceipt::new(format!("log-{}", Uuid::new_v4())))
            }
            CustomMode::Http => {
                debug!(
                    phone = %mask_phone(phone),
                    "Sending SMS via custom gateway"
                );
                let receipt = self.send_http(phone, message).await?;
                info!(
                    phone = %mask_phone(phone),
                    message_id = %receipt.message_id,
                    "SMS accepted by custom gateway"
                );
                Ok(receipt)
            }
        }
    }

    fn provider_name(&self) -> &str {
        "custom"
    }
}
