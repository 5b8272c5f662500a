use serde::{Deserialize, Serialize};

/// Storage model for a logged vital sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRecord {
    pub id: String,
    pub user_id: String,
    /// Wire name of the vital type, e.g. `bp` or `bloodSugar`
    pub vital_type: String,
    pub value: f64,
    pub secondary_value: Option<f64>,
    pub unit: String,
    pub notes: Option<String>,
    pub recorded_at: String,
}
