use serde::{Deserialize, Serialize};

/// Storage model for a clinical alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub patient_id: String,
    pub provider_id: Option<String>,
    /// `critical`, `warning` or `info`
    pub alert_type: String,
    pub title: String,
    pub message: String,
    pub vital_id: Option<String>,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}
