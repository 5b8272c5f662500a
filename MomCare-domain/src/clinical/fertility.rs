use chrono::{DateTime, Utc};
use serde::Serialize;

/// Days before and after ovulation counted as the fertile window
pub const FERTILE_WINDOW_DAYS: i64 = 3;
const LUTEAL_PHASE_DAYS: i64 = 14;

/// Where a patient is in her menstrual cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStatus {
    pub cycle_day: i64,
    pub cycle_length: i64,
    pub ovulation_day: i64,
    /// Negative once ovulation has passed
    pub days_to_ovulation: i64,
    pub in_fertile_window: bool,
}

impl CycleStatus {
    pub fn compute(lmp: DateTime<Utc>, cycle_length: i64, now: DateTime<Utc>) -> Self {
        let cycle_length = if cycle_length > 0 { cycle_length } else { 28 };
        let days_since_lmp = (now - lmp).num_days();
        let cycle_day = days_since_lmp.rem_euclid(cycle_length);
        let ovulation_day = cycle_length - LUTEAL_PHASE_DAYS;
        let days_to_ovulation = ovulation_day - cycle_day;

        Self {
            cycle_day,
            cycle_length,
            ovulation_day,
            days_to_ovulation,
            in_fertile_window: days_to_ovulation.abs() <= FERTILE_WINDOW_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn lmp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_cycle_day_wraps() {
        let status = CycleStatus::compute(lmp(), 28, lmp() + Duration::days(30));
        assert_eq!(status.cycle_day, 2);
        assert_eq!(status.ovulation_day, 14);
        assert_eq!(status.days_to_ovulation, 12);
        assert!(!status.in_fertile_window);
    }

    #[test]
    fn test_fertile_window_bounds() {
        let inside_early = CycleStatus::compute(lmp(), 28, lmp() + Duration::days(11));
        assert!(inside_early.in_fertile_window);

        let inside_late = CycleStatus::compute(lmp(), 28, lmp() + Duration::days(17));
        assert_eq!(inside_late.days_to_ovulation, -3);
        assert!(inside_late.in_fertile_window);

        let before = CycleStatus::compute(lmp(), 28, lmp() + Duration::days(10));
        assert!(!before.in_fertile_window);

        let after = CycleStatus::compute(lmp(), 28, lmp() + Duration::days(18));
        assert!(!after.in_fertile_window);
    }

    #[test]
    fn test_longer_cycle_moves_ovulation() {
        let status = CycleStatus::compute(lmp(), 32, lmp() + Duration::days(18));
        assert_eq!(status.ovulation_day, 18);
        assert_eq!(status.days_to_ovulation, 0);
        assert!(status.in_fertile_window);
    }
}
