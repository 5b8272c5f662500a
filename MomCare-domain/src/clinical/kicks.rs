use crate::entities::Severity;

pub const DECREASED_MOVEMENT_FACTOR: &str = "Decreased fetal movement";
pub const LOW_KICKS_WARNING: &str =
    "Low kick count. Please contact your healthcare provider if this continues.";
/// Points added to the risk score the first time movement is low
pub const DECREASED_MOVEMENT_PENALTY: u32 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct KickAssessment {
    pub kicks_per_hour: f64,
    /// Severity of the decreased movement factor, when movement is low
    pub concern: Option<Severity>,
}

/// Whether an existing risk factor records decreased movement
pub fn is_movement_factor(factor: &str) -> bool {
    factor.to_lowercase().contains("fetal movement")
}

pub fn kicks_per_hour(count: u32, duration_minutes: f64) -> f64 {
    f64::from(count) / duration_minutes * 60.0
}

/// Below 5 kicks per hour is a concern, below 3 a serious one
pub fn assess(count: u32, duration_minutes: f64) -> KickAssessment {
    let rate = kicks_per_hour(count, duration_minutes);
    let concern = if rate < 3.0 {
        Some(Severity::High)
    } else if rate < 5.0 {
        Some(Severity::Medium)
    } else {
        None
    };

    KickAssessment {
        kicks_per_hour: rate,
        concern,
    }
}

/// Round to one decimal for display
pub fn round_rate(rate: f64) -> f64 {
    (rate * 10.0).round() / 10.0
}
