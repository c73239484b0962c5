//! Fake providers and factory for dispatch tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::providers::{ProviderFactory, SmsProvider, SmsReceipt};

/// How a fake provider responds to a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Accept the message and record it
    Succeed,
    /// Reject with a gateway error
    Fail,
}

/// A message accepted by a fake provider
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub provider: String,
    pub phone: String,
    pub message: String,
}

/// Factory handing out scripted fake providers by name
pub struct FakeProviderFactory {
    behaviors: HashMap<String, FakeBehavior>,
    sent: Arc<RwLock<Vec<SentMessage>>>,
}

impl FakeProviderFactory {
    pub fn new(behaviors: &[(&str, FakeBehavior)]) -> Self {
        Self {
            behaviors: behaviors
                .iter()
                .map(|(name, behavior)| (name.to_string(), *behavior))
                .collect(),
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Messages accepted across all fake providers, in send order
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl ProviderFactory for FakeProviderFactory {
    async fn create(
        &self,
        provider_name: &str,
        _settings: &serde_json::Value,
    ) -> Result<Box<dyn SmsProvider>, String> {
        let behavior = self
            .behaviors
            .get(provider_name)
            .ok_or_else(|| format!("unknown provider: {provider_name}"))?;

        Ok(Box::new(FakeProvider {
            name: provider_name.to_string(),
            behavior: *behavior,
            sent: self.sent.clone(),
        }))
    }
}

struct FakeProvider {
    name: String,
    behavior: FakeBehavior,
    sent: Arc<RwLock<Vec<SentMessage>>>,
}

#[async_trait]
impl SmsProvider for FakeProvider {
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        match self.behavior {
            FakeBehavior::Succeed => {
                self.sent.write().await.push(SentMessage {
                    provider: self.name.clone(),
                    phone: phone.to_string(),
                    message: message.to_string(),
                });
                Ok(SmsReceipt::new(format!("fake-{}", Uuid::new_v4())))
            }
            FakeBehavior::Fail => Err(format!("{} gateway is down", self.name)),
        }
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
