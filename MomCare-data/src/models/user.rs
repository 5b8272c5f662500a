use serde::{Deserialize, Serialize};

/// Storage model for a user account (patient or provider)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// Lower-cased, unique
    pub email: String,
    pub password_hash: String,
    /// `patient` or `provider`
    pub role: String,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub blood_type: Option<String>,
    /// `fertility` or `pregnancy`
    pub current_mode: String,
    /// Assigned provider
    pub provider_id: Option<String>,
    pub last_menstrual_period: Option<String>,
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub medical_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub notifications_enabled: bool,
    /// Push token
    pub fcm_token: Option<String>,
    pub created_at: String,
}
