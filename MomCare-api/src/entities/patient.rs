use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use mom_care_domain::entities::{Alert, AlertType, Message, PregnancyDetails, Vital};
use mom_care_domain::services::{ChatExchange, ContractionOutcome, KickOutcome, LatestVitals, VitalOutcome};

/// Alert raised by a logged vital
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertSummary {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalLoggedResponse {
    pub message: String,
    pub vital: Vital,
    pub alert: Option<AlertSummary>,
    pub risk_score: Option<u32>,
}

impl From<VitalOutcome> for VitalLoggedResponse {
    fn from(outcome: VitalOutcome) -> Self {
        Self {
            message: "Vital logged successfully".to_string(),
            vital: outcome.vital,
            alert: outcome.alert.map(|alert| AlertSummary {
                alert_type: alert.alert_type,
                message: alert.message,
            }),
            risk_score: outcome.risk_score,
        }
    }
}

/// Query parameters for vital history
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct VitalHistoryQuery {
    /// Only this vital type
    #[serde(rename = "type")]
    pub vital_type: Option<String>,
    /// Look-back window in days (default: 30)
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VitalListResponse {
    pub vitals: Vec<Vital>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LatestVitalsResponse {
    pub latest: LatestVitals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PregnancyResponse {
    pub pregnancy: PregnancyDetails,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartPregnancyRequest {
    /// RFC 3339 or `YYYY-MM-DD`
    pub last_menstrual_period: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PregnancyStartedResponse {
    pub message: String,
    pub pregnancy: PregnancyDetails,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KickLoggedResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: KickOutcome,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContractionLoggedResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ContractionOutcome,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertListResponse {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertReadResponse {
    pub message: String,
    pub alert: Alert,
}

impl AlertReadResponse {
    pub fn new(alert: Alert) -> Self {
        Self {
            message: "Alert marked as read".to_string(),
            alert,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// Id and text of one chat message
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatLine {
    pub id: String,
    pub content: String,
}

impl From<Message> for ChatLine {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            content: message.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub user_message: ChatLine,
    pub ai_message: ChatLine,
}

impl From<ChatExchange> for ChatResponse {
    fn from(exchange: ChatExchange) -> Self {
        Self {
            user_message: exchange.user_message.into(),
            ai_message: exchange.ai_message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}
