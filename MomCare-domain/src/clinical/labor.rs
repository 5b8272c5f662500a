//! The 5-1-1 labor heuristic: contractions about five minutes apart, lasting
//! about a minute, sustained for an hour.

use chrono::{DateTime, Duration, Utc};

pub const WINDOW_MINUTES: i64 = 60;
pub const MIN_CONTRACTIONS: usize = 10;
pub const MIN_MEAN_DURATION_SECS: f64 = 50.0;
pub const MAX_MEAN_INTERVAL_MINUTES: f64 = 5.0;

pub const LABOR_WARNING: &str =
    "Your contractions may indicate labor. Contact your healthcare provider or go to the hospital.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contraction {
    pub at: DateTime<Utc>,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaborAssessment {
    pub contractions_in_window: usize,
    pub mean_duration_secs: Option<f64>,
    pub mean_interval_minutes: Option<f64>,
    pub labor_likely: bool,
}

/// Start of the trailing window ending at `now`
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::minutes(WINDOW_MINUTES)
}

/// Evaluate the contractions of the trailing hour
pub fn evaluate_five_one_one(contractions: &[Contraction], now: DateTime<Utc>) -> LaborAssessment {
    let since = window_start(now);
    let mut recent: Vec<&Contraction> = contractions
        .iter()
        .filter(|c| c.at >= since && c.at <= now)
        .collect();
    recent.sort_by_key(|c| c.at);

    let count = recent.len();
    let mean_duration_secs = (count > 0)
        .then(|| recent.iter().map(|c| c.duration_secs).sum::<f64>() / count as f64);

    let mean_interval_minutes = (count > 1).then(|| {
        let total: i64 = recent
            .windows(2)
            .map(|pair| (pair[1].at - pair[0].at).num_milliseconds())
            .sum();
        total as f64 / (count - 1) as f64 / 60_000.0
    });

    let labor_likely = count >= MIN_CONTRACTIONS
        && mean_duration_secs.is_some_and(|d| d >= MIN_MEAN_DURATION_SECS)
        && mean_interval_minutes.is_some_and(|i| i <= MAX_MEAN_INTERVAL_MINUTES);

    LaborAssessment {
        contractions_in_window: count,
        mean_duration_secs,
        mean_interval_minutes,
        labor_likely,
    }
}
