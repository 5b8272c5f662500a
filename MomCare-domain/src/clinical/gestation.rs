//! Gestational age arithmetic, counted from the last menstrual period

use chrono::{DateTime, Duration, NaiveDate, Utc};

pub const GESTATION_DAYS: i64 = 280;
pub const MAX_WEEK: i64 = 40;
/// Oldest accepted LMP when starting a pregnancy
pub const MAX_LMP_AGE_DAYS: i64 = 300;

const SECONDS_PER_DAY: i64 = 86_400;

const BABY_SIZES: [&str; 37] = [
    "Poppy seed",
    "Sesame seed",
    "Lentil",
    "Blueberry",
    "Kidney bean",
    "Grape",
    "Kumquat",
    "Fig",
    "Lime",
    "Pea pod",
    "Lemon",
    "Apple",
    "Avocado",
    "Turnip",
    "Bell pepper",
    "Tomato",
    "Banana",
    "Carrot",
    "Spaghetti squash",
    "Mango",
    "Corn",
    "Rutabaga",
    "Scallion",
    "Cauliflower",
    "Eggplant",
    "Butternut squash",
    "Cabbage",
    "Coconut",
    "Jicama",
    "Pineapple",
    "Cantaloupe",
    "Honeydew melon",
    "Romaine lettuce",
    "Swiss chard",
    "Leek",
    "Mini watermelon",
    "Watermelon",
];
const FIRST_SIZED_WEEK: i64 = 4;

fn ceil_days(duration: Duration) -> i64 {
    let seconds = duration.num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY) + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) != 0)
}

pub fn due_date(lmp: DateTime<Utc>) -> DateTime<Utc> {
    lmp + Duration::days(GESTATION_DAYS)
}

/// Completed weeks since the LMP, capped at 40
pub fn current_week(lmp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = if now >= lmp { now - lmp } else { lmp - now };
    (ceil_days(elapsed) / 7).min(MAX_WEEK)
}

pub fn trimester(week: i64) -> u8 {
    match week {
        w if w <= 12 => 1,
        w if w <= 27 => 2,
        _ => 3,
    }
}

pub fn days_remaining(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ceil_days(due - now).max(0)
}

/// Fruit or vegetable the baby is about the size of
pub fn baby_size(week: i64) -> &'static str {
    usize::try_from(week - FIRST_SIZED_WEEK)
        .ok()
        .and_then(|idx| BABY_SIZES.get(idx))
        .copied()
        .unwrap_or("Growing baby")
}

/// Accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reject LMPs in the future or too far back to be an ongoing pregnancy
pub fn validate_lmp(lmp: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), String> {
    if lmp > now {
        return Err("Last menstrual period cannot be in the future".to_string());
    }
    if now - lmp > Duration::days(MAX_LMP_AGE_DAYS) {
        return Err(format!(
            "Last menstrual period cannot be more than {} days ago",
            MAX_LMP_AGE_DAYS
        ));
    }
    Ok(())
}
