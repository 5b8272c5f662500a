use serde::{Deserialize, Serialize};

/// Storage model for a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_ai: bool,
    pub created_at: String,
}
