use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A chat message. Assistant threads use the patient as both sender and receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: &str, receiver_id: &str, content: &str, is_ai: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            is_ai,
            created_at: Utc::now(),
        }
    }
}
