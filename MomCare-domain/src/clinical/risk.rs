//! Pregnancy risk score
//!
//! The score starts at [`BASE_SCORE`] and adds one penalty for the highest
//! matching blood pressure band and one for the highest blood sugar band.

use chrono::{DateTime, Utc};

use super::blood_pressure::{classify_bp, BpCategory};
use crate::entities::{RiskFactor, RiskLevel, Severity};

pub const BASE_SCORE: u32 = 10;
pub const MAX_SCORE: u32 = 100;

pub const SEVERE_BP_FACTOR: &str = "Severely elevated BP";
pub const HIGH_BP_FACTOR: &str = "High blood pressure";
pub const ELEVATED_BP_FACTOR: &str = "Elevated blood pressure";
pub const HIGH_SUGAR_FACTOR: &str = "High blood sugar";
pub const ELEVATED_SUGAR_FACTOR: &str = "Elevated blood sugar";

const VITAL_FACTORS: [&str; 5] = [
    SEVERE_BP_FACTOR,
    HIGH_BP_FACTOR,
    ELEVATED_BP_FACTOR,
    HIGH_SUGAR_FACTOR,
    ELEVATED_SUGAR_FACTOR,
];

/// Most recent blood pressure reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpReading {
    pub systolic: f64,
    pub diastolic: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    /// Factors derived from the readings, in evaluation order
    pub factors: Vec<(String, Severity)>,
}

impl RiskAssessment {
    /// Factors stamped with the time they were assessed
    pub fn risk_factors(&self, at: DateTime<Utc>) -> Vec<RiskFactor> {
        self.factors
            .iter()
            .map(|(factor, severity)| RiskFactor {
                factor: factor.clone(),
                severity: *severity,
                added_at: at,
            })
            .collect()
    }
}

/// Score the latest blood pressure and blood sugar readings
pub fn assess(bp: Option<BpReading>, blood_sugar: Option<f64>) -> RiskAssessment {
    let mut score = BASE_SCORE;
    let mut factors = Vec::new();

    if let Some(bp) = bp {
        // a missing diastolic cannot trigger a band on its own
        let penalty = match classify_bp(bp.systolic, bp.diastolic.unwrap_or(0.0)) {
            BpCategory::Severe => Some((40, SEVERE_BP_FACTOR, Severity::High)),
            BpCategory::High => Some((30, HIGH_BP_FACTOR, Severity::High)),
            BpCategory::Elevated => Some((15, ELEVATED_BP_FACTOR, Severity::Medium)),
            BpCategory::Normal => None,
        };
        if let Some((points, factor, severity)) = penalty {
            score += points;
            factors.push((factor.to_string(), severity));
        }
    }

    if let Some(sugar) = blood_sugar {
        if sugar > 180.0 {
            score += 25;
            factors.push((HIGH_SUGAR_FACTOR.to_string(), Severity::High));
        } else if sugar > 140.0 {
            score += 15;
            factors.push((ELEVATED_SUGAR_FACTOR.to_string(), Severity::Medium));
        }
    }

    let score = score.min(MAX_SCORE);
    RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
        factors,
    }
}

/// Whether a factor is recomputed from vitals rather than added by another rule
pub fn is_vital_factor(factor: &str) -> bool {
    VITAL_FACTORS.contains(&factor)
}

/// Raise a score by `points`, capped at [`MAX_SCORE`]
pub fn raise_score(score: u32, points: u32) -> u32 {
    score.saturating_add(points).min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(systolic: f64, diastolic: f64) -> Option<BpReading> {
        Some(BpReading { systolic, diastolic: Some(diastolic) })
    }

    #[test]
    fn test_no_readings_scores_base() {
        let assessment = assess(None, None);
        assert_eq!(assessment.score, 10);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_only_highest_bp_band_applies() {
        let severe = assess(bp(165.0, 105.0), None);
        assert_eq!(severe.score, 50);
        assert_eq!(severe.level, RiskLevel::Medium);
        assert_eq!(severe.factors, vec![(SEVERE_BP_FACTOR.to_string(), Severity::High)]);

        let high = assess(bp(142.0, 85.0), None);
        assert_eq!(high.score, 40);
        assert_eq!(high.factors[0].0, HIGH_BP_FACTOR);

        let elevated = assess(bp(118.0, 82.0), None);
        assert_eq!(elevated.score, 25);
        assert_eq!(elevated.factors[0].1, Severity::Medium);

        assert_eq!(assess(bp(110.0, 70.0), None).score, 10);
    }

    #[test]
    fn test_sugar_bands() {
        assert_eq!(assess(None, Some(140.0)).score, 10);
        assert_eq!(assess(None, Some(150.0)).score, 25);
        assert_eq!(assess(None, Some(180.0)).score, 25);
        assert_eq!(assess(None, Some(181.0)).score, 35);
    }

    #[test]
    fn test_combined_bands_reach_high() {
        let assessment = assess(bp(170.0, 110.0), Some(200.0));
        assert_eq!(assessment.score, 75);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.factors.len(), 2);
    }

    #[test]
    fn test_missing_diastolic_uses_systolic_only() {
        let assessment = assess(Some(BpReading { systolic: 125.0, diastolic: None }), None);
        assert_eq!(assessment.score, 25);
    }

    #[test]
    fn test_raise_score_caps() {
        assert_eq!(raise_score(50, 15), 65);
        assert_eq!(raise_score(95, 15), 100);
    }

    #[test]
    fn test_vital_factors() {
        assert!(is_vital_factor(HIGH_SUGAR_FACTOR));
        assert!(!is_vital_factor("Decreased fetal movement"));
    }
}
