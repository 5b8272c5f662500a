use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::{RiskLevel, Severity};
use crate::clinical::{gestation, kicks, risk};

/// A named contributor to the pregnancy risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub factor: String,
    pub severity: Severity,
    pub added_at: DateTime<Utc>,
}

/// A tracked pregnancy. At most one per user is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Pregnancy {
    pub id: String,
    pub user_id: String,
    pub last_menstrual_period: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// 0 to 100
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Pregnancy {
    /// A new active pregnancy at base risk
    pub fn start(user_id: &str, lmp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            last_menstrual_period: lmp,
            due_date: gestation::due_date(lmp),
            risk_score: risk::BASE_SCORE,
            risk_level: RiskLevel::from_score(risk::BASE_SCORE),
            risk_factors: Vec::new(),
            is_active: true,
            created_at: now,
        }
    }

    pub fn current_week(&self, now: DateTime<Utc>) -> i64 {
        gestation::current_week(self.last_menstrual_period, now)
    }

    pub fn trimester(&self, now: DateTime<Utc>) -> u8 {
        gestation::trimester(self.current_week(now))
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        gestation::days_remaining(self.due_date, now)
    }

    pub fn baby_size_comparison(&self, now: DateTime<Utc>) -> &'static str {
        gestation::baby_size(self.current_week(now))
    }

    /// Case-insensitive substring match against existing factors
    pub fn has_factor_containing(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.risk_factors
            .iter()
            .any(|f| f.factor.to_lowercase().contains(&needle))
    }

    /// Set a new score and derive the level from it
    pub fn set_score(&mut self, score: u32) {
        self.risk_score = score.min(risk::MAX_SCORE);
        self.risk_level = RiskLevel::from_score(self.risk_score);
    }

    /// Replace vital-derived factors with a fresh assessment, keeping the others.
    ///
    /// Kept movement factors carry their penalty into the new score.
    pub fn apply_assessment(&mut self, assessment: &risk::RiskAssessment, now: DateTime<Utc>) {
        self.risk_factors.retain(|f| !risk::is_vital_factor(&f.factor));
        let kept_penalty: u32 = self
            .risk_factors
            .iter()
            .filter(|f| kicks::is_movement_factor(&f.factor))
            .map(|_| kicks::DECREASED_MOVEMENT_PENALTY)
            .sum();
        self.set_score(risk::raise_score(assessment.score, kept_penalty));
        self.risk_factors.extend(assessment.risk_factors(now));
    }

    /// Snapshot with the derived values evaluated at `now`
    pub fn details(&self, now: DateTime<Utc>) -> PregnancyDetails {
        PregnancyDetails {
            current_week: self.current_week(now),
            trimester: self.trimester(now),
            days_remaining: self.days_remaining(now),
            baby_size_comparison: self.baby_size_comparison(now).to_string(),
            pregnancy: self.clone(),
        }
    }
}

/// A pregnancy together with its derived values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PregnancyDetails {
    #[serde(flatten)]
    pub pregnancy: Pregnancy,
    pub current_week: i64,
    pub trimester: u8,
    pub days_remaining: i64,
    pub baby_size_comparison: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_start_sets_due_date_and_base_risk() {
        let lmp = now() - Duration::days(24 * 7);
        let pregnancy = Pregnancy::start("u1", lmp, now());

        assert_eq!(pregnancy.due_date, lmp + Duration::days(280));
        assert_eq!(pregnancy.risk_score, 10);
        assert_eq!(pregnancy.risk_level, RiskLevel::Low);
        assert!(pregnancy.is_active);
    }

    #[test]
    fn test_details_serialize_flat() {
        let lmp = now() - Duration::days(24 * 7);
        let details = Pregnancy::start("u1", lmp, now()).details(now());

        assert_eq!(details.current_week, 24);
        assert_eq!(details.trimester, 2);
        assert_eq!(details.days_remaining, 112);
        assert_eq!(details.baby_size_comparison, "Corn");

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["currentWeek"], 24);
        assert_eq!(json["riskLevel"], "low");
        assert!(json.get("pregnancy").is_none());
    }

    #[test]
    fn test_apply_assessment_keeps_other_factors() {
        let mut pregnancy = Pregnancy::start("u1", now() - Duration::days(100), now());
        pregnancy.risk_factors.push(RiskFactor {
            factor: "Decreased fetal movement".to_string(),
            severity: Severity::Medium,
            added_at: now(),
        });
        pregnancy.risk_factors.push(RiskFactor {
            factor: risk::HIGH_BP_FACTOR.to_string(),
            severity: Severity::High,
            added_at: now(),
        });

        let assessment = risk::assess(None, Some(190.0));
        pregnancy.apply_assessment(&assessment, now());

        assert_eq!(pregnancy.risk_score, 50);
        assert_eq!(pregnancy.risk_level, RiskLevel::Medium);
        let names: Vec<&str> = pregnancy.risk_factors.iter().map(|f| f.factor.as_str()).collect();
        assert_eq!(names, vec!["Decreased fetal movement", risk::HIGH_SUGAR_FACTOR]);
        assert!(pregnancy.has_factor_containing("fetal movement"));
    }

    #[test]
    fn test_apply_assessment_caps_with_movement_penalty() {
        let mut pregnancy = Pregnancy::start("u1", now() - Duration::days(100), now());
        pregnancy.risk_factors.push(RiskFactor {
            factor: "Decreased fetal movement".to_string(),
            severity: Severity::High,
            added_at: now(),
        });

        pregnancy.apply_assessment(&risk::assess(Some(risk::BpReading { systolic: 165.0, diastolic: Some(105.0) }), Some(190.0)), now());
        assert_eq!(pregnancy.risk_score, 90);
        assert_eq!(pregnancy.risk_level, RiskLevel::High);

        pregnancy.apply_assessment(&risk::assess(Some(risk::BpReading { systolic: 118.0, diastolic: Some(75.0) }), None), now());
        assert_eq!(pregnancy.risk_score, 25);
        assert_eq!(pregnancy.risk_level, RiskLevel::Low);
    }
}
