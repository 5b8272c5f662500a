use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::AlertType;

/// A clinical alert raised for a patient and routed to their provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub patient_id: String,
    pub provider_id: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub title: String,
    pub message: String,
    /// Reading that triggered the alert
    pub vital_id: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        patient_id: &str,
        provider_id: Option<&str>,
        alert_type: AlertType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            provider_id: provider_id.map(str::to_string),
            alert_type,
            title: title.into(),
            message: message.into(),
            vital_id: None,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_vital(mut self, vital_id: &str) -> Self {
        self.vital_id = Some(vital_id.to_string());
        self
    }
}
