//! Storage records
//!
//! Records mirror table rows: timestamps are RFC 3339 strings and list
//! columns hold JSON text. Conversion to rich types happens in the domain crate.

pub mod alert;
pub mod message;
pub mod pregnancy;
pub mod user;
pub mod vital;

pub use alert::AlertRecord;
pub use message::MessageRecord;
pub use pregnancy::{PregnancyRecord, RiskFactorRecord};
pub use user::UserRecord;
pub use vital::VitalRecord;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::repository::RepositoryError;

/// Format a timestamp so that string order matches chronological order
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::DateParse(format!("{}: {}", value, e)))
}

/// Fresh record identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_timestamp_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let later = earlier + Duration::milliseconds(1);

        let a = format_timestamp(earlier);
        let b = format_timestamp(later);

        assert!(a < b);
        assert!(a.ends_with('Z'));
        assert_eq!(a, "2024-03-09T23:59:59.000000Z");
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("2024-03-09T10:00:00.000000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap());

        let offset = parse_timestamp("2024-03-09T12:00:00+02:00").unwrap();
        assert_eq!(offset, parsed);

        assert!(matches!(parse_timestamp("yesterday"), Err(RepositoryError::DateParse(_))));
    }
}
