//! Dialog eSMS Adapter
//!
//! The quirkiest gateway in the fleet, with two operating modes:
//!
//! - **OAuth/bulk**: username/password login yields an access token and a
//!   refresh token. The access token's expiry is read out of its JWT
//!   payload without validating the signature; that decode is advisory
//!   only, used to schedule refreshes, never for security. A 401 on send
//!   triggers one refresh-and-retry.
//! - **Legacy GET** (older deployments): the destination is formatted
//!   three different ways and tried in turn against a query-string
//!   endpoint until the free-text response body looks like an acceptance.
//!   The success indicators, pattern, and parameter names vary between
//!   deployments of the same gateway, so all of them are configuration,
//!   not constants. The sniffing is inherently fragile; that is the
//!   gateway's contract, not ours to fix.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use otp_core::phone::{local_variants, mask_phone};
use otp_core::providers::{SmsProvider, SmsReceipt};

use crate::InfrastructureError;

use super::default_request_timeout_secs;

/// Remaining validity below which the access token is renewed before a send
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

fn default_to_param() -> String {
    "to".to_string()
}

fn default_message_param() -> String {
    "msg".to_string()
}

fn default_success_indicators() -> Vec<String> {
    vec![
        "success".to_string(),
        "submitted".to_string(),
        "ok".to_string(),
    ]
}

fn default_success_pattern() -> String {
    r#"(?i)(status|result|code)\s*["']?\s*[:=]\s*["']?(0|200|ok|success)"#.to_string()
}

/// Dialog adapter configuration, one variant per operating mode
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DialogConfig {
    /// OAuth bulk API
    Oauth(OauthConfig),
    /// Legacy query-string gateway
    LegacyGet(LegacyGetConfig),
}

/// OAuth/bulk mode configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OauthConfig {
    /// API root, e.g. `https://esms.dialog.lk/api/v1`
    pub base_url: String,
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
    /// Registered sender mask shown to the recipient
    #[serde(default)]
    pub source_address: Option<String>,
    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Legacy GET mode configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyGetConfig {
    /// Full endpoint URL the query string is appended to
    pub base_url: String,
    /// Query parameter carrying the destination number
    #[serde(default = "default_to_param")]
    pub to_param: String,
    /// Query parameter carrying the message body
    #[serde(default = "default_message_param")]
    pub message_param: String,
    /// Static parameters appended to every request (API keys etc.)
    #[serde(default)]
    pub extra_params: HashMap<String, String>,
    /// Substrings whose presence in the response body means acceptance
    #[serde(default = "default_success_indicators")]
    pub success_indicators: Vec<String>,
    /// Regex that also means acceptance when it matches the body
    #[serde(default = "default_success_pattern")]
    pub success_pattern: String,
    /// Timeout for API requests in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// OAuth session state owned by the adapter instance
#[derive(Debug, Clone)]
pub(crate) struct OauthSession {
    pub(crate) access_token: String,
    pub(crate) refresh_token: Option<String>,
    /// Advisory expiry decoded from the token payload; `None` when the
    /// token is not a decodable JWT, in which case the session is kept
    /// until the gateway says 401
    pub(crate) expires_at: Option<DateTime<Utc>>,
}

impl OauthSession {
    pub(crate) fn needs_refresh(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                expires_at - Utc::now() < ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS)
            }
            None => false,
        }
    }
}

/// Read the `exp` claim out of a JWT's payload segment.
///
/// No signature validation on purpose: the value only schedules local
/// refreshes and the gateway remains the authority on token validity.
pub(crate) fn decode_token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}

/// Free-text acceptance sniffing: any configured indicator substring
/// (case-insensitive), or a match of the configured pattern.
pub(crate) fn sniff_success(body: &str, indicators: &[String], pattern: &Regex) -> bool {
    let lowered = body.to_lowercase();
    if indicators
        .iter()
        .any(|indicator| lowered.contains(&indicator.to_lowercase()))
    {
        return true;
    }
    pattern.is_match(body)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    token: String,
    #[serde(default, alias = "refreshToken", alias = "refresh_token")]
    refresh_token: Option<String>,
}

impl From<TokenResponse> for OauthSession {
    fn from(response: TokenResponse) -> Self {
        let expires_at = decode_token_expiry(&response.token);
        Self {
            access_token: response.token,
            refresh_token: response.refresh_token,
            expires_at,
        }
    }
}

/// Dialog eSMS adapter
pub struct DialogSmsService {
    client: reqwest::Client,
    config: DialogConfig,
    session: RwLock<Option<OauthSession>>,
    /// Compiled acceptance pattern, legacy mode only
    success_pattern: Option<Regex>,
}

impl DialogSmsService {
    /// Create a new Dialog adapter
    pub fn new(config: DialogConfig) -> Result<Self, InfrastructureError> {
        let timeout_secs = match &config {
            DialogConfig::Oauth(c) => c.request_timeout_secs,
            DialogConfig::LegacyGet(c) => c.request_timeout_secs,
        };

        let success_pattern = match &config {
            DialogConfig::LegacyGet(c) => Some(Regex::new(&c.success_pattern).map_err(|e| {
                InfrastructureError::Config(format!("invalid success_pattern: {e}"))
            })?),
            DialogConfig::Oauth(_) => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
            success_pattern,
        })
    }

    // --- OAuth mode ---

    async fn login(&self, config: &OauthConfig) -> Result<OauthSession, String> {
        let url = format!("{}/login", config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": config.username,
                "password": config.password,
            }))
            .send()
            .await
            .map_err(|e| format!("Dialog login request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("Dialog login failed with HTTP {}", response.status()));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Dialog login response unparseable: {e}"))?;

        debug!(event = "dialog_login", "Obtained Dialog OAuth session");
        Ok(tokens.into())
    }

    async fn refresh(
        &self,
        config: &OauthConfig,
        refresh_token: &str,
    ) -> Result<OauthSession, String> {
        let url = format!("{}/refresh", config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| format!("Dialog refresh request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "Dialog refresh failed with HTTP {}",
                response.status()
            ));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Dialog refresh response unparseable: {e}"))?;

        debug!(event = "dialog_refresh", "Refreshed Dialog OAuth session");
        Ok(tokens.into())
    }

    /// Renew the session under an already-held write lock: refresh token
    /// first when we have one, full login otherwise or when refresh fails.
    async fn renew_locked(
        &self,
        config: &OauthConfig,
        session: &mut Option<OauthSession>,
    ) -> Result<String, String> {
        let refresh_token = session.as_ref().and_then(|s| s.refresh_token.clone());

        let renewed = match refresh_token {
            Some(token) => match self.refresh(config, &token).await {
                Ok(renewed) => renewed,
                Err(e) => {
                    warn!(error = %e, "Dialog token refresh failed, logging in again");
                    self.login(config).await?
                }
            },
            None => self.login(config).await?,
        };

        let access_token = renewed.access_token.clone();
        *session = Some(renewed);
        Ok(access_token)
    }

    /// Hand out a usable access token, renewing when the session is absent
    /// or inside the refresh margin.
    async fn ensure_session(&self, config: &OauthConfig) -> Result<String, String> {
        {
            let session = self.session.read().await;
            if let Some(session) = session.as_ref() {
                if !session.needs_refresh() {
                    return Ok(session.access_token.clone());
                }
            }
        }

        let mut session = self.session.write().await;
        // another task may have renewed while we waited for the lock
        if let Some(current) = session.as_ref() {
            if !current.needs_refresh() {
                return Ok(current.access_token.clone());
            }
        }
        self.renew_locked(config, &mut session).await
    }

    /// Renew unconditionally; used after the gateway said 401, when the
    /// locally tracked expiry cannot be trusted.
    async fn force_renew(&self, config: &OauthConfig) -> Result<String, String> {
        let mut session = self.session.write().await;
        self.renew_locked(config, &mut session).await
    }

    async fn post_sms(
        &self,
        config: &OauthConfig,
        access_token: &str,
        phone: &str,
        message: &str,
    ) -> Result<reqwest::Response, String> {
        let url = format!("{}/sms", config.base_url.trim_end_matches('/'));
        // the bulk API wants the msisdn without the plus
        let msisdn = local_variants(phone).with_country_code;

        self.client
            .post(&url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "sourceAddress": config.source_address,
                "message": message,
                "transaction_id": Uuid::new_v4().to_string(),
                "msisdn": [{ "mobile": msisdn }],
            }))
            .send()
            .await
            .map_err(|e| format!("Dialog send request failed: {e}"))
    }

    async fn send_oauth(
        &self,
        config: &OauthConfig,
        phone: &str,
        message: &str,
    ) -> Result<SmsReceipt, String> {
        let access_token = self.ensure_session(config).await?;
        let mut response = self.post_sms(config, &access_token, phone, message).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            // one refresh-and-retry, then give up
            warn!(
                phone = %mask_phone(phone),
                event = "dialog_token_rejected",
                "Dialog send returned 401, renewing session and retrying once"
            );
            let access_token = self.force_renew(config).await?;
            response = self.post_sms(config, &access_token, phone, message).await?;
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            debug!(status = %status, body = %body, "Dialog send rejected");
            return Err(format!("Dialog send failed with HTTP {status}"));
        }

        let message_id =
            extract_message_id(&body).unwrap_or_else(|| format!("dialog-{}", Uuid::new_v4()));

        info!(
            phone = %mask_phone(phone),
            message_id = %message_id,
            "SMS accepted by Dialog bulk API"
        );

        Ok(SmsReceipt::new(message_id))
    }

    // --- Legacy GET mode ---

    async fn send_legacy(
        &self,
        config: &LegacyGetConfig,
        phone: &str,
        message: &str,
    ) -> Result<SmsReceipt, String> {
        let pattern = self
            .success_pattern
            .as_ref()
            .ok_or_else(|| "legacy gateway pattern missing".to_string())?;

        let variants = local_variants(phone);
        let mut last_body = String::new();

        for candidate in variants.as_candidates() {
            let mut params: Vec<(&str, &str)> = vec![
                (config.to_param.as_str(), candidate),
                (config.message_param.as_str(), message),
            ];
            for (key, value) in &config.extra_params {
                params.push((key.as_str(), value.as_str()));
            }

            let response = match self.client.get(&config.base_url).query(&params).send().await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Legacy gateway request failed");
                    last_body = format!("request error: {e}");
                    continue;
                }
            };

            let body = response.text().await.unwrap_or_default();

            if sniff_success(&body, &config.success_indicators, pattern) {
                info!(
                    phone = %mask_phone(phone),
                    "SMS accepted by legacy gateway"
                );
                return Ok(SmsReceipt::new(format!("legacy-{}", Uuid::new_v4())));
            }

            debug!(
                phone = %mask_phone(phone),
                body = %body,
                "Legacy gateway did not accept phone format, trying next"
            );
            last_body = body;
        }

        // the body stays server-side: the orchestrator logs this string,
        // callers only ever see ProviderUnavailable
        Err(format!(
            "legacy gateway accepted no phone format; last response: {last_body}"
        ))
    }
}

/// Pull a message identifier out of the bulk API's response, whose shape
/// varies by deployment
pub(crate) fn extract_message_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidates = ["campaignId", "messageId", "transactionId", "id"];

    for object in [Some(&value), value.get("data")].into_iter().flatten() {
        for key in candidates {
            match object.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

#[async_trait]
impl SmsProvider for DialogSmsService {
    async fn send_sms(&self, phone: &str, message: &str) -> Result<SmsReceipt, String> {
        match &self.config {
            DialogConfig::Oauth(config) => self.send_oauth(config, phone, message).await,
            DialogConfig::LegacyGet(config) => self.send_legacy(config, phone, message).await,
        }
    }

    fn provider_name(&self) -> &str {
        "dialog"
    }
}
