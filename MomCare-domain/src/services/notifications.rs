//! Provider-initiated push notifications

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::ServiceError;
use crate::notify::{MulticastResult, PushError, PushMessage, PushNotifier};

pub const PREGNANCY_TOPIC: &str = "pregnancy_users";
const DEFAULT_ALERT_TITLE: &str = "⚠️ Health Alert";
const DEFAULT_ALERT_SEVERITY: &str = "medium";

/// `{token, title, body, data?}`
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SendRequest {
    pub token: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SendMultipleRequest {
    pub tokens: Option<Vec<String>>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SendTopicRequest {
    pub topic: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TopicRequest {
    pub token: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PregnancyAlertRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MulticastReceipt {
    pub success: bool,
    pub success_count: u32,
    pub failure_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TopicReceipt {
    pub success: bool,
    pub message: String,
}

fn required(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Validation(message.to_string()))
}

fn build_message(title: String, body: String, data: Option<BTreeMap<String, String>>) -> PushMessage {
    let mut message = PushMessage::new(title, body);
    message.data = data.unwrap_or_default();
    message
}

pub struct NotificationService {
    push: Arc<dyn PushNotifier>,
}

impl NotificationService {
    pub fn new(push: Arc<dyn PushNotifier>) -> Self {
        Self { push }
    }

    fn ensure_enabled(&self) -> Result<(), ServiceError> {
        if self.push.is_enabled() {
            Ok(())
        } else {
            Err(PushError::NotConfigured.into())
        }
    }

    pub async fn send(&self, request: SendRequest) -> Result<SendReceipt, ServiceError> {
        self.ensure_enabled()?;
        const MISSING: &str = "token, title, and body are required";
        let token = required(request.token, MISSING)?;
        let message = build_message(required(request.title, MISSING)?, required(request.body, MISSING)?, request.data);

        let message_id = self.push.send_to_token(&token, &message).await?;
        info!("Push notification sent: {}", message_id);
        Ok(SendReceipt { success: true, message_id })
    }

    pub async fn send_multiple(&self, request: SendMultipleRequest) -> Result<MulticastReceipt, ServiceError> {
        self.ensure_enabled()?;
        let tokens: Vec<String> = request
            .tokens
            .unwrap_or_default()
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(ServiceError::Validation("tokens array is required".to_string()));
        }
        const MISSING: &str = "title and body are required";
        let message = build_message(required(request.title, MISSING)?, required(request.body, MISSING)?, request.data);

        let MulticastResult { success_count, failure_count } = self.push.send_to_tokens(&tokens, &message).await?;
        info!("Multicast push: {} delivered, {} failed", success_count, failure_count);
        Ok(MulticastReceipt { success: true, success_count, failure_count })
    }

    pub async fn send_topic(&self, request: SendTopicRequest) -> Result<SendReceipt, ServiceError> {
        self.ensure_enabled()?;
        const MISSING: &str = "topic, title, and body are required";
        let topic = required(request.topic, MISSING)?;
        let message = build_message(required(request.title, MISSING)?, required(request.body, MISSING)?, request.data);

        let message_id = self.push.send_to_topic(&topic, &message).await?;
        info!("Push notification sent to topic {}", topic);
        Ok(SendReceipt { success: true, message_id })
    }

    pub async fn subscribe(&self, request: TopicRequest) -> Result<TopicReceipt, ServiceError> {
        self.ensure_enabled()?;
        let (token, topic) = Self::membership(request)?;
        self.push.subscribe(&[token], &topic).await?;
        Ok(TopicReceipt {
            success: true,
            message: format!("Subscribed to {}", topic),
        })
    }

    pub async fn unsubscribe(&self, request: TopicRequest) -> Result<TopicReceipt, ServiceError> {
        self.ensure_enabled()?;
        let (token, topic) = Self::membership(request)?;
        self.push.unsubscribe(&[token], &topic).await?;
        Ok(TopicReceipt {
            success: true,
            message: format!("Unsubscribed from {}", topic),
        })
    }

    fn membership(request: TopicRequest) -> Result<(String, String), ServiceError> {
        const MISSING: &str = "token and topic are required";
        Ok((required(request.token, MISSING)?, required(request.topic, MISSING)?))
    }

    /// Broadcast to every subscribed pregnancy-mode device
    pub async fn alert_pregnancy(&self, request: PregnancyAlertRequest) -> Result<SendReceipt, ServiceError> {
        self.ensure_enabled()?;
        let body = required(request.body, "body is required")?;
        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ALERT_TITLE.to_string());
        let severity = request
            .severity
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ALERT_SEVERITY.to_string());

        let message = PushMessage::new(title, body)
            .with_data("type", "health_alert")
            .with_data("severity", severity);
        let message_id = self.push.send_to_topic(PREGNANCY_TOPIC, &message).await?;
        info!("Pregnancy alert broadcast: {}", message_id);
        Ok(SendReceipt { success: true, message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::push::MockPushNotifier;
    use crate::notify::DisabledPushNotifier;

    fn enabled_mock() -> MockPushNotifier {
        let mut push = MockPushNotifier::new();
        push.expect_is_enabled().return_const(true);
        push
    }

    fn text(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[tokio::test]
    async fn test_disabled_push_is_unavailable_before_validation() {
        let service = NotificationService::new(Arc::new(DisabledPushNotifier));
        match service.send(SendRequest::default()).await {
            Err(ServiceError::Unavailable(msg)) => assert_eq!(msg, "Push notifications not configured"),
            other => panic!("expected unavailable, got {:?}", other),
        }
        assert!(matches!(
            service.subscribe(TopicRequest::default()).await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_send_requires_fields() {
        let service = NotificationService::new(Arc::new(enabled_mock()));
        let request = SendRequest {
            token: text("device-1"),
            title: text("Hello"),
            ..Default::default()
        };
        match service.send(request).await {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, "token, title, and body are required"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(matches!(
            service.send_multiple(SendMultipleRequest { tokens: Some(vec![]), ..Default::default() }).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_send_passes_data_through() {
        let mut push = enabled_mock();
        push.expect_send_to_token()
            .withf(|token, message| {
                token == "device-1"
                    && message.title == "Reminder"
                    && message.data.get("kind").map(String::as_str) == Some("checkup")
            })
            .times(1)
            .returning(|_, _| Ok("msg-1".to_string()));
        let service = NotificationService::new(Arc::new(push));

        let receipt = service
            .send(SendRequest {
                token: text("device-1"),
                title: text("Reminder"),
                body: text("Checkup tomorrow"),
                data: Some(BTreeMap::from([("kind".to_string(), "checkup".to_string())])),
            })
            .await
            .unwrap();
        assert_eq!(receipt, SendReceipt { success: true, message_id: "msg-1".to_string() });
    }

    #[tokio::test]
    async fn test_send_multiple_reports_counts() {
        let mut push = enabled_mock();
        push.expect_send_to_tokens()
            .withf(|tokens, _| tokens.len() == 2)
            .returning(|_, _| Ok(MulticastResult { success_count: 1, failure_count: 1 }));
        let service = NotificationService::new(Arc::new(push));

        let receipt = service
            .send_multiple(SendMultipleRequest {
                tokens: Some(vec!["a".to_string(), "b".to_string()]),
                title: text("Hi"),
                body: text("There"),
                data: None,
            })
            .await
            .unwrap();
        assert_eq!(receipt.success_count, 1);
        assert_eq!(receipt.failure_count, 1);
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe_messages() {
        let mut push = enabled_mock();
        push.expect_subscribe()
            .withf(|tokens, topic| tokens == ["device-1".to_string()] && topic == "news")
            .returning(|_, _| Ok(()));
        push.expect_unsubscribe().returning(|_, _| Ok(()));
        let service = NotificationService::new(Arc::new(push));

        let request = TopicRequest { token: text("device-1"), topic: text("news") };
        assert_eq!(service.subscribe(request.clone()).await.unwrap().message, "Subscribed to news");
        assert_eq!(service.unsubscribe(request).await.unwrap().message, "Unsubscribed from news");
    }

    #[tokio::test]
    async fn test_pregnancy_alert_defaults() {
        let mut push = enabled_mock();
        push.expect_send_to_topic()
            .withf(|topic, message| {
                topic == PREGNANCY_TOPIC
                    && message.title == "⚠️ Health Alert"
                    && message.data.get("type").map(String::as_str) == Some("health_alert")
                    && message.data.get("severity").map(String::as_str) == Some("medium")
            })
            .returning(|_, _| Ok("topic-msg".to_string()));
        let service = NotificationService::new(Arc::new(push));

        let receipt = service
            .alert_pregnancy(PregnancyAlertRequest { body: text("Heat wave today"), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(receipt.message_id, "topic-msg");
    }

    #[tokio::test]
    async fn test_gateway_failure_is_internal() {
        let mut push = enabled_mock();
        push.expect_send_to_topic()
            .returning(|_, _| Err(PushError::Rejected("500 - boom".to_string())));
        let service = NotificationService::new(Arc::new(push));

        let result = service
            .send_topic(SendTopicRequest {
                topic: text("news"),
                title: text("Hi"),
                body: text("There"),
                data: None,
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Internal(_))));
    }
}
