//! Provider seams for SMS delivery.
//!
//! Concrete gateway adapters live in the infrastructure crate; the
//! dispatch service only sees these traits. The factory is an explicit,
//! injected dependency so tests can supply fake adapters, and adapter
//! construction is a closed match over known provider names rather than an
//! open registry.

use async_trait::async_trait;

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq)]
pub struct SmsReceipt {
    /// Provider-assigned message identifier
    pub message_id: String,
    /// Estimated delivery cost, 0.0 when the gateway does not report one
    pub cost_estimate: f64,
}

impl SmsReceipt {
    /// Receipt with a message id and no cost information
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            cost_estimate: 0.0,
        }
    }
}

/// One external SMS gateway.
///
/// Adapters carry whatever session/retry quirks their gateway requires but
/// never retry beyond their own contract; trying a fallback provider is the
/// dispatch service's job. Error strings stay server-side (logged, mapped
/// to `ProviderUnavailable`) and may carry gateway response detail.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Send a text message to an E.164 destination
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String>;

    /// Short adapter name, recorded on the challenge as `provider_used`
    fn provider_name(&self) -> &str;
}

/// Constructs adapters from configuration rows
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Build the adapter for a provider name and its settings blob.
    ///
    /// Async because some gateway SDKs load credentials asynchronously.
    /// Unknown names and malformed settings are construction errors; the
    /// dispatch service treats them like a failed send so a configured
    /// fallback still gets its chance.
    async fn create(
        &self,
        provider_name: &str,
        settings: &serde_json::Value,
    ) -> Result<Box<dyn SmsProvider>, String>;
}
