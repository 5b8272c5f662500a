use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use mom_care_domain::entities::Message;
use mom_care_domain::services::provider::PatientRef;

/// Query parameters for the patient list
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct PatientListQuery {
    /// `low`, `medium`, `high` or `all`
    pub risk: Option<String>,
    /// Case-insensitive name fragment
    pub search: Option<String>,
}

/// Query parameters for provider alerts
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAlertQuery {
    /// `critical`, `warning`, `info` or `all`
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Patient id is required"))]
    pub patient_id: String,
    #[validate(length(min = 1, message = "Message content required"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageSentResponse {
    pub message: String,
    pub data: Message,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SimulationResponse {
    pub message: String,
    pub patient: PatientRef,
}
