use serde::{Deserialize, Serialize};

/// A risk factor as stored in the `risk_factors` JSON column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactorRecord {
    pub factor: String,
    pub severity: String,
    pub added_at: String,
}

/// Storage model for a pregnancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregnancyRecord {
    pub id: String,
    pub user_id: String,
    pub last_menstrual_period: String,
    pub due_date: String,
    pub risk_score: i64,
    /// `low`, `medium` or `high`
    pub risk_level: String,
    pub risk_factors: Vec<RiskFactorRecord>,
    pub is_active: bool,
    pub created_at: String,
}
