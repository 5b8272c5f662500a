use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::{BloodType, Mode, Role};

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;

/// A patient or provider account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<i64>,
    /// Centimetres
    pub height: Option<f64>,
    /// Kilograms
    pub weight: Option<f64>,
    pub blood_type: Option<BloodType>,
    pub current_mode: Mode,
    /// Assigned provider, for patients
    pub provider_id: Option<String>,
    pub last_menstrual_period: Option<DateTime<Utc>>,
    pub average_cycle_length: i64,
    pub average_period_length: i64,
    pub medical_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub notifications_enabled: bool,
    /// Push token
    pub fcm_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New account with every optional field unset
    pub fn new(email: &str, password_hash: String, name: &str, role: Role, mode: Mode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            role,
            name: name.trim().to_string(),
            phone: None,
            age: None,
            height: None,
            weight: None,
            blood_type: None,
            current_mode: mode,
            provider_id: None,
            last_menstrual_period: None,
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_period_length: DEFAULT_PERIOD_LENGTH,
            medical_conditions: Vec::new(),
            allergies: Vec::new(),
            medications: Vec::new(),
            notifications_enabled: true,
            fcm_token: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_provider(&self) -> bool {
        self.role == Role::Provider
    }

    /// Body mass index rounded to one decimal
    pub fn bmi(&self) -> Option<f64> {
        match (self.height, self.weight) {
            (Some(height), Some(weight)) if height > 0.0 && weight > 0.0 => {
                let metres = height / 100.0;
                Some((weight / (metres * metres) * 10.0).round() / 10.0)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("  Jane@Example.COM ", "hash".to_string(), " Jane ", Role::Patient, Mode::Fertility)
    }

    #[test]
    fn test_new_user_normalizes_and_defaults() {
        let user = user();
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name, "Jane");
        assert_eq!(user.average_cycle_length, 28);
        assert_eq!(user.average_period_length, 5);
        assert!(user.notifications_enabled);
        assert!(!user.is_provider());
    }

    #[test]
    fn test_bmi() {
        let mut user = user();
        assert_eq!(user.bmi(), None);

        user.height = Some(165.0);
        assert_eq!(user.bmi(), None);

        user.weight = Some(62.5);
        assert_eq!(user.bmi(), Some(23.0));

        user.weight = Some(70.0);
        assert_eq!(user.bmi(), Some(25.7));
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["currentMode"], "fertility");
        assert_eq!(json["averageCycleLength"], 28);
    }
}
