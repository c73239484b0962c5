//! Tests for the configurable local/dev gateway

use otp_core::providers::SmsProvider;

use crate::sms::custom_http::{CustomHttpConfig, CustomHttpSmsService, CustomMode};

#[tokio::test]
async fn test_log_mode_always_succeeds_without_delivery() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let settings = serde_json::json!({ "mode": "log" });
    let config: CustomHttpConfig = serde_json::from_value(settings).unwrap();
    let service = CustomHttpSmsService::new(config).unwrap();

    let receipt = service
        .send_sms("+94771234567", "Your verification code is: 123456.")
        .await
        .unwrap();

    assert!(receipt.message_id.starts_with("log-"));
    assert_eq!(receipt.cost_estimate, 0.0);
    assert_eq!(service.provider_name(), "custom");
}

#[test]
fn test_http_mode_requires_base_url() {
    let settings = serde_json::json!({ "mode": "http" });
    let config: CustomHttpConfig = serde_json::from_value(settings).unwrap();

    assert!(CustomHttpSmsService::new(config).is_err());
}

#[test]
fn test_parameter_names_are_configurable() {
    let settings = serde_json::json!({
        "mode": "http",
        "base_url": "http://gateway.local/push",
        "method": "post",
        "to_param": "dst",
        "message_param": "body",
        "extra_params": { "apikey": "k1" }
    });

    let config: CustomHttpConfig = serde_json::from_value(settings).unwrap();
    assert_eq!(config.mode, CustomMode::Http);
    assert_eq!(config.to_param, "dst");
    assert_eq!(config.message_param, "body");
    assert_eq!(config.extra_params["apikey"], "k1");
    assert!(CustomHttpSmsService::new(config).is_ok());
}

#[test]
fn test_unknown_method_rejected() {
    let settings = serde_json::json!({
        "mode": "http",
        "base_url": "http://gateway.local/push",
        "method": "delete"
    });

    let config: CustomHttpConfig = serde_json::from_value(settings).unwrap();
    assert!(CustomHttpSmsService::new(config).is_err());
}
