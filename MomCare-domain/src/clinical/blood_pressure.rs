use crate::entities::AlertType;

/// Blood pressure category used for alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BpCategory {
    Normal,
    Elevated,
    High,
    Severe,
}

impl BpCategory {
    /// Alert raised for this category, if any
    pub fn alert_type(&self) -> Option<AlertType> {
        match self {
            BpCategory::Severe => Some(AlertType::Critical),
            BpCategory::High => Some(AlertType::Warning),
            BpCategory::Normal | BpCategory::Elevated => None,
        }
    }

    /// Suffix used in alert messages
    pub fn alert_detail(&self) -> &'static str {
        match self {
            BpCategory::Severe => "Severely elevated",
            _ => "Above normal threshold",
        }
    }
}

/// Categorize a reading; either number crossing a band is enough
pub fn classify_bp(systolic: f64, diastolic: f64) -> BpCategory {
    if systolic >= 160.0 || diastolic >= 100.0 {
        BpCategory::Severe
    } else if systolic >= 140.0 || diastolic >= 90.0 {
        BpCategory::High
    } else if systolic >= 120.0 || diastolic >= 80.0 {
        BpCategory::Elevated
    } else {
        BpCategory::Normal
    }
}
