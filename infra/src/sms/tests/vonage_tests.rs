//! Tests for Vonage response interpretation

use crate::sms::vonage::{VonageConfig, VonageSmsService};

#[test]
fn test_accepted_message_parses_receipt() {
    let body = r#"{
        "message-count": "1",
        "messages": [{
            "to": "94771234567",
            "message-id": "0A0000000123ABCD1",
            "status": "0",
            "remaining-balance": "3.14159265",
            "message-price": "0.03330000",
            "network": "41301"
        }]
    }"#;

    let receipt = VonageSmsService::parse_response(body).unwrap();
    assert_eq!(receipt.message_id, "0A0000000123ABCD1");
    assert!((receipt.cost_estimate - 0.0333).abs() < 1e-9);
}

#[test]
fn test_http_200_with_error_status_is_a_failure() {
    let body = r#"{
        "message-count": "1",
        "messages": [{
            "status": "4",
            "error-text": "Bad Credentials"
        }]
    }"#;

    let err = VonageSmsService::parse_response(body).unwrap_err();
    assert!(err.contains("status 4"));
    assert!(err.contains("Bad Credentials"));
}

#[test]
fn test_empty_messages_is_a_failure() {
    let err = VonageSmsService::parse_response(r#"{"message-count": "0", "messages": []}"#)
        .unwrap_err();
    assert!(err.contains("no messages"));
}

#[test]
fn test_unparseable_body_is_a_failure() {
    assert!(VonageSmsService::parse_response("<html>gateway timeout</html>").is_err());
}

#[test]
fn test_missing_price_defaults_to_zero() {
    let body = r#"{"messages": [{"message-id": "m1", "status": "0"}]}"#;

    let receipt = VonageSmsService::parse_response(body).unwrap();
    assert_eq!(receipt.cost_estimate, 0.0);
}

#[test]
fn test_config_defaults() {
    let settings = serde_json::json!({
        "api_key": "key",
        "api_secret": "secret"
    });

    let config: VonageConfig = serde_json::from_value(settings).unwrap();
    assert_eq!(config.base_url, "https://rest.nexmo.com/sms/json");
    assert_eq!(config.from, "Verify");
    assert_eq!(config.request_timeout_secs, 15);
    assert!(VonageSmsService::new(config).is_ok());
}
