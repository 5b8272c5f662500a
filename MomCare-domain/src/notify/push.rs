//! Push notification seam
//!
//! [`HttpPushNotifier`] talks to a JSON push gateway. When no gateway is
//! configured the services get a [`DisabledPushNotifier`] instead.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::PushConfig;

const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push notifications not configured")]
    NotConfigured,

    #[error("Push gateway request failed: {0}")]
    Transport(String),

    #[error("Push gateway rejected the request: {0}")]
    Rejected(String),
}

/// Notification title and body plus string data for the client app
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Data sent to devices, including the click action the app listens for
    fn payload_data(&self) -> BTreeMap<String, String> {
        let mut data = self.data.clone();
        data.insert("click_action".to_string(), CLICK_ACTION.to_string());
        data
    }
}

/// Outcome of sending to several devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticastResult {
    pub success_count: u32,
    pub failure_count: u32,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PushNotifier: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Returns the gateway's message id
    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<String, PushError>;

    async fn send_to_tokens(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastResult, PushError>;

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<String, PushError>;

    async fn subscribe(&self, tokens: &[String], topic: &str) -> Result<(), PushError>;

    async fn unsubscribe(&self, tokens: &[String], topic: &str) -> Result<(), PushError>;
}

/// Used when no push gateway is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPushNotifier;

#[async_trait]
impl PushNotifier for DisabledPushNotifier {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send_to_token(&self, _token: &str, _message: &PushMessage) -> Result<String, PushError> {
        Err(PushError::NotConfigured)
    }

    async fn send_to_tokens(
        &self,
        _tokens: &[String],
        _message: &PushMessage,
    ) -> Result<MulticastResult, PushError> {
        Err(PushError::NotConfigured)
    }

    async fn send_to_topic(&self, _topic: &str, _message: &PushMessage) -> Result<String, PushError> {
        Err(PushError::NotConfigured)
    }

    async fn subscribe(&self, _tokens: &[String], _topic: &str) -> Result<(), PushError> {
        Err(PushError::NotConfigured)
    }

    async fn unsubscribe(&self, _tokens: &[String], _topic: &str) -> Result<(), PushError> {
        Err(PushError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(alias = "messageId", alias = "name")]
    message_id: String,
}

/// JSON push gateway client
#[derive(Debug, Clone)]
pub struct HttpPushNotifier {
    client: Client,
    base_url: String,
    server_key: Option<String>,
}

impl HttpPushNotifier {
    pub fn new(config: &PushConfig) -> Self {
        info!("Push notifications enabled via gateway {}", config.gateway_url);
        Self {
            client: Client::new(),
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            server_key: config.server_key.clone(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response, PushError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.server_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Push gateway request to {} failed: {}", url, e);
            PushError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Push gateway returned {} for {}: {}", status, path, text);
            return Err(PushError::Rejected(format!("{} - {}", status, text)));
        }

        Ok(response)
    }

    fn notification(message: &PushMessage) -> serde_json::Value {
        json!({ "title": message.title, "body": message.body })
    }

    async fn send(&self, target: (&str, &str), message: &PushMessage) -> Result<String, PushError> {
        let (field, value) = target;
        let mut body = json!({
            "notification": Self::notification(message),
            "data": message.payload_data(),
        });
        body[field] = json!(value);

        let response: SendResponse = self
            .post("/send", body)
            .await?
            .json()
            .await
            .map_err(|e| PushError::Rejected(format!("Unexpected gateway response: {}", e)))?;
        Ok(response.message_id)
    }

    async fn topic_membership(&self, path: &str, tokens: &[String], topic: &str) -> Result<(), PushError> {
        self.post(path, json!({ "tokens": tokens, "topic": topic })).await?;
        Ok(())
    }
}

#[async_trait]
impl PushNotifier for HttpPushNotifier {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<String, PushError> {
        self.send(("token", token), message).await
    }

    async fn send_to_tokens(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastResult, PushError> {
        let body = json!({
            "tokens": tokens,
            "notification": Self::notification(message),
            "data": message.payload_data(),
        });

        self.post("/send-multiple", body)
            .await?
            .json::<MulticastResult>()
            .await
            .map_err(|e| PushError::Rejected(format!("Unexpected gateway response: {}", e)))
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<String, PushError> {
        self.send(("topic", topic), message).await
    }

    async fn subscribe(&self, tokens: &[String], topic: &str) -> Result<(), PushError> {
        self.topic_membership("/topics/subscribe", tokens, topic).await
    }

    async fn unsubscribe(&self, tokens: &[String], topic: &str) -> Result<(), PushError> {
        self.topic_membership("/topics/unsubscribe", tokens, topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_data_adds_click_action() {
        let message = PushMessage::new("t", "b").with_data("type", "bp_alert");
        let data = message.payload_data();
        assert_eq!(data.get("type").map(String::as_str), Some("bp_alert"));
        assert_eq!(data.get("click_action").map(String::as_str), Some(CLICK_ACTION));
        assert!(!message.data.contains_key("click_action"));
    }

    #[tokio::test]
    async fn test_disabled_notifier_reports_not_configured() {
        let notifier = DisabledPushNotifier;
        assert!(!notifier.is_enabled());
        let err = notifier.send_to_token("tok", &PushMessage::new("t", "b")).await.unwrap_err();
        assert!(matches!(err, PushError::NotConfigured));
        assert_eq!(err.to_string(), "Push notifications not configured");
    }

    #[test]
    fn test_send_response_accepts_gateway_spellings() {
        let a: SendResponse = serde_json::from_str(r#"{"messageId":"m1"}"#).unwrap();
        let b: SendResponse = serde_json::from_str(r#"{"name":"projects/x/messages/2"}"#).unwrap();
        assert_eq!(a.message_id, "m1");
        assert_eq!(b.message_id, "projects/x/messages/2");
    }

    #[test]
    fn test_http_notifier_trims_base_url() {
        let notifier = HttpPushNotifier::new(&PushConfig {
            gateway_url: "http://push.local/".to_string(),
            server_key: None,
        });
        assert_eq!(notifier.base_url, "http://push.local");
        assert!(notifier.is_enabled());
    }
}
