//! Vonage SMS Adapter
//!
//! API-key signed HTTP gateway. The interesting quirk: HTTP 200 does not
//! mean the message was accepted. The response body carries a per-message
//! status code and only `"0"` is success, so the body is always inspected.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use otp_core::phone::mask_phone;
use otp_core::providers::{SmsProvider, SmsReceipt};

use crate::InfrastructureError;

use super::default_request_timeout_secs;

fn default_base_url() -> String {
    "https://rest.nexmo.com/sms/json".to_string()
}

fn default_sender() -> String {
    "Verify".to_string()
}

/// Vonage adapter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VonageConfig {
    /// API key, sent in the request body
    pub api_key: String,
    /// API secret, sent in the request body
    pub api_secret: String,
    /// Sender id or number shown to the recipient
    #[serde(default = "default_sender")]
    pub from: String,
    /// Endpoint URL; overridable for regional deployments
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct VonageResponse {
    #[serde(default)]
    messages: Vec<VonageMessage>,
}

#[derive(Debug, Deserialize)]
struct VonageMessage {
    #[serde(rename = "message-id", default)]
    message_id: Option<String>,
    status: String,
    #[serde(rename = "error-text", default)]
    error_text: Option<String>,
    #[serde(rename = "message-price", default)]
    message_price: Option<String>,
}

/// Vonage SMS adapter
pub struct VonageSmsService {
    client: reqwest::Client,
    config: VonageConfig,
}

impl VonageSmsService {
    /// Create a new Vonage adapter
    pub fn new(config: VonageConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Interpret a response body: per-message status "0" is the only
    /// success, whatever the HTTP status said.
    pub(crate) fn parse_response(body: &str) -> Result<SmsReceipt, String> {
        let response: VonageResponse =
            serde_json::from_str(body).map_err(|e| format!("unparseable Vonage response: {e}"))?;

        let message = response
            .messages
            .into_iter()
            .next()
            .ok_or_else(|| "Vonage response contained no messages".to_string())?;

        if message.status != "0" {
            return Err(format!(
                "Vonage rejected message (status {}): {}",
                message.status,
                message.error_text.as_deref().unwrap_or("no error text")
            ));
        }

        let cost_estimate = message
            .message_price
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(SmsReceipt {
            message_id: message.message_id.unwrap_or_default(),
            cost_estimate,
        })
    }
}

#[async_trait]
impl SmsProvider for VonageSmsService {
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        debug!(
            phone = %mask_phone(phone),
            "Sending SMS via Vonage"
        );

        // Vonage wants the msisdn without the plus
        let to = phone.trim_start_matches('+');

        let params = [
            ("api_key", self.config.api_key.as_str()),
            ("api_secret", self.config.api_secret.as_str()),
            ("from", self.config.from.as_str()),
            ("to", to),
            ("text", message),
        ];

        let response = self
            .client
            .post(&self.config.base_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| format!("Vonage request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Vonage response read failed: {e}"))?;

        if !status.is_success() {
            warn!(status = %status, "Vonage returned non-success HTTP status");
            return Err(format!("Vonage HTTP error {status}"));
        }

        let receipt = Self::parse_response(&body)?;

        info!(
            phone = %mask_phone(phone),
            message_id = %receipt.message_id,
            cost_estimate = receipt.cost_estimate,
            "SMS accepted by Vonage"
        );

        Ok(receipt)
    }

    fn provider_name(&self) -> &str {
        "vonage"
    }
}
