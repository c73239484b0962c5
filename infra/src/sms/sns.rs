//! AWS SNS SMS Adapter
//!
//! Cloud pub/sub style gateway: a single publish call per send with
//! transactional SMS attributes. Errors propagate directly.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sns::{config::Region, types::MessageAttributeValue, Client as SnsClient};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use otp_core::phone::mask_phone;
use otp_core::providers::{SmsProvider, SmsReceipt};

use crate::InfrastructureError;

use super::default_request_timeout_secs;

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_sms_type() -> String {
    "Transactional".to_string()
}

/// AWS SNS adapter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnsConfig {
    /// AWS Access Key ID
    pub access_key_id: String,
    /// AWS Secret Access Key
    pub secret_access_key: String,
    /// AWS Region (e.g., "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,
    /// SMS sender ID (optional, not supported in all regions)
    #[serde(default)]
    pub sender_id: Option<String>,
    /// SMS type: "Transactional" or "Promotional"
    #[serde(default = "default_sms_type")]
    pub sms_type: String,
    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// AWS SNS SMS adapter
pub struct SnsSmsService {
    client: SnsClient,
    config: SnsConfig,
}

impl SnsSmsService {
    /// Create a new AWS SNS adapter
    pub async fn new(config: SnsConfig) -> Result<Self, InfrastructureError> {
        if config.sms_type != "Transactional" && config.sms_type != "Promotional" {
            return Err(InfrastructureError::Config(
                "SNS sms_type must be either 'Transactional' or 'Promotional'".to_string(),
            ));
        }

        let credentials_provider = aws_credential_types::Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "otpgate_sns_adapter",
        );

        let region = Region::new(config.region.clone());
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials_provider)
            .load()
            .await;

        let client = SnsClient::new(&aws_config);

        debug!(region = %config.region, "AWS SNS adapter initialized");

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SmsProvider for SnsSmsService {
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        debug!(
            phone = %mask_phone(phone),
            "Sending SMS via AWS SNS"
        );

        let sms_type = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(&self.config.sms_type)
            .build()
            .map_err(|e| format!("SNS attribute build failed: {e}"))?;

        let mut publish = self
            .client
            .publish()
            .phone_number(phone)
            .message(message)
            .message_attributes("AWS.SNS.SMS.SMSType", sms_type);

        if let Some(sender_id) = &self.config.sender_id {
            let attribute = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(sender_id)
                .build()
                .map_err(|e| format!("SNS attribute build failed: {e}"))?;
            publish = publish.message_attributes("AWS.SNS.SMS.SenderID", attribute);
        }

        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let output = tokio::time::timeout(timeout, publish.send())
            .await
            .map_err(|_| {
                format!(
                    "SNS publish timed out after {}s",
                    self.config.request_timeout_secs
                )
            })?
            .map_err(|e| format!("SNS publish failed: {e}"))?;

        let message_id = output.message_id().unwrap_or_default().to_string();

        info!(
            phone = %mask_phone(phone),
            message_id = %message_id,
            "SMS accepted by AWS SNS"
        );

        Ok(SmsReceipt::new(message_id))
    }

    fn provider_name(&self) -> &str {
        "sns"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let settings = json!({
            "access_key_id": "AKIATEST",
            "secret_access_key": "secret"
        });

        let config: SnsConfig = serde_json::from_value(settings).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.sms_type, "Transactional");
        assert!(config.sender_id.is_none());
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[tokio::test]
    async fn test_invalid_sms_type_rejected() {
        let config = SnsConfig {
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            region: default_region(),
            sender_id: None,
            sms_type: "Bulk".to_string(),
            request_timeout_secs: 15,
        };

        let result = SnsSmsService::new(config).await;
        assert!(result.is_err());
    }
}
