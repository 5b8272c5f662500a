use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::VitalType;

/// A logged vital sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Vital {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub vital_type: VitalType,
    /// Systolic, kick count or contraction seconds depending on the type
    pub value: f64,
    /// Diastolic, kick session minutes or contraction intensity
    pub secondary_value: Option<f64>,
    pub unit: String,
    pub notes: Option<String>,
    /// When the reading was taken
    pub date: DateTime<Utc>,
}

impl Vital {
    pub fn new(user_id: &str, vital_type: VitalType, value: f64, secondary_value: Option<f64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            vital_type,
            value,
            secondary_value,
            unit: vital_type.default_unit().to_string(),
            notes: None,
            date: Utc::now(),
        }
    }

    /// `systolic/diastolic`, as shown on dashboards
    pub fn bp_text(&self) -> String {
        match self.secondary_value {
            Some(diastolic) => format!("{}/{}", format_number(self.value), format_number(diastolic)),
            None => format_number(self.value),
        }
    }

    /// Value with unit, e.g. `120/80 mmHg` or `64.5 kg`
    pub fn display_value(&self) -> String {
        match self.vital_type {
            VitalType::Bp => format!("{} {}", self.bp_text(), self.unit),
            _ => format!("{} {}", format_number(self.value), self.unit),
        }
    }
}

/// Print whole numbers without a trailing `.0`
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vital_uses_default_unit() {
        let vital = Vital::new("u1", VitalType::BloodSugar, 150.0, None);
        assert_eq!(vital.unit, "mg/dL");
    }

    #[test]
    fn test_display_values() {
        let bp = Vital::new("u1", VitalType::Bp, 142.0, Some(91.0));
        assert_eq!(bp.bp_text(), "142/91");
        assert_eq!(bp.display_value(), "142/91 mmHg");

        let weight = Vital::new("u1", VitalType::Weight, 64.5, None);
        assert_eq!(weight.display_value(), "64.5 kg");
    }

    #[test]
    fn test_serializes_type_and_date() {
        let json = serde_json::to_value(Vital::new("u1", VitalType::Bp, 120.0, Some(80.0))).unwrap();
        assert_eq!(json["type"], "bp");
        assert_eq!(json["secondaryValue"], 80.0);
        assert!(json.get("date").is_some());
    }
}
