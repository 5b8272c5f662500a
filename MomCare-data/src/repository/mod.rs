// Repository module structure
pub mod errors;
mod alerts;
mod messages;
mod pregnancies;
mod users;
mod vitals;

use std::sync::Arc;

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::DatabasePool;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use alerts::{AlertQuery, AlertRepository, AlertScope, SqliteAlertRepository};
pub use messages::{MessageRepository, SqliteMessageRepository};
pub use pregnancies::{PregnancyRepository, SqlitePregnancyRepository};
pub use users::{PatientFilter, SqliteUserRepository, UserRepository};
pub use vitals::{SqliteVitalRepository, VitalQuery, VitalRepository};

/// Every repository the services need, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub pregnancies: Arc<dyn PregnancyRepository>,
    pub vitals: Arc<dyn VitalRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    /// SQLite-backed repositories sharing one pool
    pub fn sqlite(pool: DatabasePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            pregnancies: Arc::new(SqlitePregnancyRepository::new(pool.clone())),
            vitals: Arc::new(SqliteVitalRepository::new(pool.clone())),
            alerts: Arc::new(SqliteAlertRepository::new(pool.clone())),
            messages: Arc::new(SqliteMessageRepository::new(pool)),
        }
    }
}

/// Decode a JSON text column
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    Ok(serde_json::to_string(value)?)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use crate::models::*;

    pub fn user(email: &str, role: &str, provider_id: Option<&str>) -> UserRecord {
        UserRecord {
            id: new_id(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            phone: None,
            age: Some(29),
            height_cm: Some(165.0),
            weight_kg: Some(62.5),
            blood_type: Some("O+".to_string()),
            current_mode: "fertility".to_string(),
            provider_id: provider_id.map(str::to_string),
            last_menstrual_period: None,
            average_cycle_length: 28,
            average_period_length: 5,
            medical_conditions: vec![],
            allergies: vec!["penicillin".to_string()],
            medications: vec![],
            notifications_enabled: true,
            fcm_token: None,
            created_at: format_timestamp(Utc::now()),
        }
    }

    pub fn vital(user_id: &str, vital_type: &str, value: f64, recorded_at: &str) -> VitalRecord {
        VitalRecord {
            id: new_id(),
            user_id: user_id.to_string(),
            vital_type: vital_type.to_string(),
            value,
            secondary_value: None,
            unit: "mmHg".to_string(),
            notes: None,
            recorded_at: recorded_at.to_string(),
        }
    }
}
