//! Conversion functions between domain entities and storage records.
//! They follow the pattern `convert_to_[target_layer]_[model_name]`.

use std::str::FromStr;

use mom_care_data::models::{
    format_timestamp, parse_timestamp, AlertRecord, MessageRecord, PregnancyRecord,
    RiskFactorRecord, UserRecord, VitalRecord,
};
use mom_care_data::repository::RepositoryError;

use super::{Alert, Message, Pregnancy, RiskFactor, User, Vital};

/// Parse a stored enum column
fn parse_column<T: FromStr<Err = String>>(value: &str) -> Result<T, RepositoryError> {
    value.parse::<T>().map_err(RepositoryError::Validation)
}

fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, RepositoryError> {
    value.map(parse_timestamp).transpose()
}

pub fn convert_to_domain_user(record: UserRecord) -> Result<User, RepositoryError> {
    Ok(User {
        role: parse_column(&record.role)?,
        current_mode: parse_column(&record.current_mode)?,
        blood_type: record.blood_type.as_deref().map(parse_column).transpose()?,
        last_menstrual_period: parse_optional_timestamp(record.last_menstrual_period.as_deref())?,
        created_at: parse_timestamp(&record.created_at)?,
        id: record.id,
        email: record.email,
        password_hash: record.password_hash,
        name: record.name,
        phone: record.phone,
        age: record.age,
        height: record.height_cm,
        weight: record.weight_kg,
        provider_id: record.provider_id,
        average_cycle_length: record.average_cycle_length,
        average_period_length: record.average_period_length,
        medical_conditions: record.medical_conditions,
        allergies: record.allergies,
        medications: record.medications,
        notifications_enabled: record.notifications_enabled,
        fcm_token: record.fcm_token,
    })
}

pub fn convert_to_data_user(user: &User) -> UserRecord {
    UserRecord {
        id: user.id.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role.to_string(),
        name: user.name.clone(),
        phone: user.phone.clone(),
        age: user.age,
        height_cm: user.height,
        weight_kg: user.weight,
        blood_type: user.blood_type.map(|b| b.to_string()),
        current_mode: user.current_mode.to_string(),
        provider_id: user.provider_id.clone(),
        last_menstrual_period: user.last_menstrual_period.map(format_timestamp),
        average_cycle_length: user.average_cycle_length,
        average_period_length: user.average_period_length,
        medical_conditions: user.medical_conditions.clone(),
        allergies: user.allergies.clone(),
        medications: user.medications.clone(),
        notifications_enabled: user.notifications_enabled,
        fcm_token: user.fcm_token.clone(),
        created_at: format_timestamp(user.created_at),
    }
}

pub fn convert_to_domain_pregnancy(record: PregnancyRecord) -> Result<Pregnancy, RepositoryError> {
    let risk_factors = record
        .risk_factors
        .into_iter()
        .map(|f| {
            Ok(RiskFactor {
                severity: parse_column(&f.severity)?,
                added_at: parse_timestamp(&f.added_at)?,
                factor: f.factor,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

    Ok(Pregnancy {
        last_menstrual_period: parse_timestamp(&record.last_menstrual_period)?,
        due_date: parse_timestamp(&record.due_date)?,
        risk_score: u32::try_from(record.risk_score.clamp(0, 100)).unwrap_or_default(),
        risk_level: parse_column(&record.risk_level)?,
        created_at: parse_timestamp(&record.created_at)?,
        id: record.id,
        user_id: record.user_id,
        risk_factors,
        is_active: record.is_active,
    })
}

pub fn convert_to_data_pregnancy(pregnancy: &Pregnancy) -> PregnancyRecord {
    PregnancyRecord {
        id: pregnancy.id.clone(),
        user_id: pregnancy.user_id.clone(),
        last_menstrual_period: format_timestamp(pregnancy.last_menstrual_period),
        due_date: format_timestamp(pregnancy.due_date),
        risk_score: i64::from(pregnancy.risk_score),
        risk_level: pregnancy.risk_level.to_string(),
        risk_factors: pregnancy
            .risk_factors
            .iter()
            .map(|f| RiskFactorRecord {
                factor: f.factor.clone(),
                severity: f.severity.to_string(),
                added_at: format_timestamp(f.added_at),
            })
            .collect(),
        is_active: pregnancy.is_active,
        created_at: format_timestamp(pregnancy.created_at),
    }
}

pub fn convert_to_domain_vital(record: VitalRecord) -> Result<Vital, RepositoryError> {
    Ok(Vital {
        vital_type: parse_column(&record.vital_type)?,
        date: parse_timestamp(&record.recorded_at)?,
        id: record.id,
        user_id: record.user_id,
        value: record.value,
        secondary_value: record.secondary_value,
        unit: record.unit,
        notes: record.notes,
    })
}

pub fn convert_to_data_vital(vital: &Vital) -> VitalRecord {
    VitalRecord {
        id: vital.id.clone(),
        user_id: vital.user_id.clone(),
        vital_type: vital.vital_type.to_string(),
        value: vital.value,
        secondary_value: vital.secondary_value,
        unit: vital.unit.clone(),
        notes: vital.notes.clone(),
        recorded_at: format_timestamp(vital.date),
    }
}

pub fn convert_to_domain_alert(record: AlertRecord) -> Result<Alert, RepositoryError> {
    Ok(Alert {
        alert_type: parse_column(&record.alert_type)?,
        read_at: parse_optional_timestamp(record.read_at.as_deref())?,
        created_at: parse_timestamp(&record.created_at)?,
        id: record.id,
        patient_id: record.patient_id,
        provider_id: record.provider_id,
        title: record.title,
        message: record.message,
        vital_id: record.vital_id,
        is_read: record.is_read,
    })
}

pub fn convert_to_data_alert(alert: &Alert) -> AlertRecord {
    AlertRecord {
        id: alert.id.clone(),
        patient_id: alert.patient_id.clone(),
        provider_id: alert.provider_id.clone(),
        alert_type: alert.alert_type.to_string(),
        title: alert.title.clone(),
        message: alert.message.clone(),
        vital_id: alert.vital_id.clone(),
        is_read: alert.is_read,
        read_at: alert.read_at.map(format_timestamp),
        created_at: format_timestamp(alert.created_at),
    }
}

pub fn convert_to_domain_message(record: MessageRecord) -> Result<Message, RepositoryError> {
    Ok(Message {
        created_at: parse_timestamp(&record.created_at)?,
        id: record.id,
        sender_id: record.sender_id,
        receiver_id: record.receiver_id,
        content: record.content,
        is_ai: record.is_ai,
    })
}

pub fn convert_to_data_message(message: &Message) -> MessageRecord {
    MessageRecord {
        id: message.id.clone(),
        sender_id: message.sender_id.clone(),
        receiver_id: message.receiver_id.clone(),
        content: message.content.clone(),
        is_ai: message.is_ai,
        created_at: format_timestamp(message.created_at),
    }
}

/// Convert a batch of records, failing on the first bad row
pub fn convert_all<R, T>(
    records: Vec<R>,
    convert: fn(R) -> Result<T, RepositoryError>,
) -> Result<Vec<T>, RepositoryError> {
    records.into_iter().map(convert).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AlertType, BloodType, Mode, Role, Severity, VitalType};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_user_round_trip_keeps_enums_and_dates() {
        let mut user = User::new("a@b.com", "hash".to_string(), "A", Role::Patient, Mode::Pregnancy);
        user.blood_type = Some(BloodType::AbPositive);
        user.last_menstrual_period = Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());

        let record = convert_to_data_user(&user);
        assert_eq!(record.role, "patient");
        assert_eq!(record.current_mode, "pregnancy");
        assert_eq!(record.blood_type.as_deref(), Some("AB+"));
        assert_eq!(record.last_menstrual_period.as_deref(), Some("2024-01-15T00:00:00.000000Z"));

        let back = convert_to_domain_user(record).unwrap();
        assert_eq!(back.blood_type, Some(BloodType::AbPositive));
        assert_eq!(back.last_menstrual_period, user.last_menstrual_period);
        assert_eq!(back.password_hash, "hash");
    }

    #[test]
    fn test_bad_enum_column_is_rejected() {
        let user = User::new("a@b.com", "hash".to_string(), "A", Role::Patient, Mode::Fertility);
        let mut record = convert_to_data_user(&user);
        record.role = "admin".to_string();

        let err = convert_to_domain_user(record).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(msg) if msg.contains("admin")));
    }

    #[test]
    fn test_pregnancy_factors_convert() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut pregnancy = Pregnancy::start("u1", now - Duration::days(90), now);
        pregnancy.risk_factors.push(RiskFactor {
            factor: "High blood sugar".to_string(),
            severity: Severity::High,
            added_at: now,
        });

        let record = convert_to_data_pregnancy(&pregnancy);
        assert_eq!(record.risk_factors[0].severity, "high");

        let back = convert_to_domain_pregnancy(record).unwrap();
        assert_eq!(back, pregnancy);
    }

    #[test]
    fn test_vital_and_alert_records() {
        let vital = Vital::new("u1", VitalType::FetalMovement, 8.0, Some(30.0));
        let record = convert_to_data_vital(&vital);
        assert_eq!(record.vital_type, "fetalMovement");
        assert_eq!(record.unit, "kicks");

        let alert = Alert::new("u1", Some("p1"), AlertType::Critical, "t", "m").with_vital(&vital.id);
        let record = convert_to_data_alert(&alert);
        assert_eq!(record.alert_type, "critical");
        assert_eq!(record.vital_id.as_deref(), Some(vital.id.as_str()));
        assert!(record.read_at.is_none());
    }
}
