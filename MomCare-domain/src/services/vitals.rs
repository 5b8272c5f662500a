use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use mom_care_data::models::format_timestamp;
use mom_care_data::repository::{Repositories, VitalQuery};

use super::{active_pregnancy, ServiceError};
use crate::clinical::{classify_bp, risk, BpReading};
use crate::entities::conversions::{
    convert_all, convert_to_data_alert, convert_to_data_pregnancy, convert_to_data_vital,
    convert_to_domain_vital,
};
use crate::entities::vital::format_number;
use crate::entities::{Alert, AlertType, Mode, User, Vital, VitalType};
use crate::notify::realtime::NEW_ALERT;
use crate::notify::{PushMessage, PushNotifier, RealtimeHub};

/// Diastolic assumed when a BP reading comes without one
const DEFAULT_DIASTOLIC: f64 = 80.0;
const SUGAR_WARNING_ABOVE: f64 = 140.0;
const SUGAR_CRITICAL_ABOVE: f64 = 180.0;
const DEFAULT_HISTORY_DAYS: i64 = 30;
const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LogVitalRequest {
    #[serde(rename = "type")]
    pub vital_type: String,
    pub value: f64,
    pub secondary_value: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

/// What logging a vital produced
#[derive(Debug, Clone)]
pub struct VitalOutcome {
    pub vital: Vital,
    pub alert: Option<Alert>,
    /// New pregnancy risk score, when it was recomputed
    pub risk_score: Option<u32>,
}

/// Newest reading per tracked type
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LatestVitals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp: Option<Vital>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Vital>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<Vital>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vital>,
}

fn check_reading(vital_type: VitalType, value: f64, secondary: Option<f64>) -> Result<(), ServiceError> {
    if !value.is_finite() || secondary.is_some_and(|s| !s.is_finite()) {
        return Err(ServiceError::Validation("Value must be a finite number".to_string()));
    }
    match vital_type {
        VitalType::Bp => {
            if !(40.0..=300.0).contains(&value) {
                return Err(ServiceError::Validation("Systolic must be between 40 and 300".to_string()));
            }
            if secondary.is_some_and(|d| !(20.0..=200.0).contains(&d)) {
                return Err(ServiceError::Validation("Diastolic must be between 20 and 200".to_string()));
            }
        }
        VitalType::Contraction => {
            if secondary.is_some_and(|i| !(1.0..=10.0).contains(&i)) {
                return Err(ServiceError::Validation("Intensity must be between 1 and 10".to_string()));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Vitals logging with threshold alerts and risk recomputation
pub struct VitalsService {
    repos: Repositories,
    hub: RealtimeHub,
    push: Arc<dyn PushNotifier>,
}

impl VitalsService {
    pub fn new(repos: Repositories, hub: RealtimeHub, push: Arc<dyn PushNotifier>) -> Self {
        Self { repos, hub, push }
    }

    pub async fn log(&self, user: &User, request: LogVitalRequest) -> Result<VitalOutcome, ServiceError> {
        let vital_type = request
            .vital_type
            .parse::<VitalType>()
            .map_err(|_| ServiceError::Validation(format!("Invalid vital type: {}", request.vital_type)))?;
        check_reading(vital_type, request.value, request.secondary_value)?;

        let mut vital = Vital::new(&user.id, vital_type, request.value, request.secondary_value);
        if let Some(unit) = request.unit.filter(|u| !u.trim().is_empty()) {
            vital.unit = unit;
        }
        vital.notes = request.notes.filter(|n| !n.trim().is_empty());
        self.repos.vitals.create(convert_to_data_vital(&vital)).await?;
        debug!("Logged {} vital {} for user {}", vital_type, vital.id, user.id);

        let alert = match vital_type {
            VitalType::Bp => self.check_blood_pressure(user, &vital).await?,
            VitalType::BloodSugar if vital.value > SUGAR_WARNING_ABOVE => {
                Some(self.blood_sugar_alert(user, &vital).await?)
            }
            _ => None,
        };

        let risk_score = match vital_type {
            VitalType::Bp | VitalType::BloodSugar if user.current_mode == Mode::Pregnancy => {
                self.recompute_risk(user).await?
            }
            _ => None,
        };

        Ok(VitalOutcome { vital, alert, risk_score })
    }

    async fn check_blood_pressure(&self, user: &User, vital: &Vital) -> Result<Option<Alert>, ServiceError> {
        let diastolic = vital.secondary_value.unwrap_or(DEFAULT_DIASTOLIC);
        let category = classify_bp(vital.value, diastolic);
        let Some(alert_type) = category.alert_type() else {
            return Ok(None);
        };

        let reading = format!("{}/{}", format_number(vital.value), format_number(diastolic));
        let alert = Alert::new(
            &user.id,
            user.provider_id.as_deref(),
            alert_type,
            "High Blood Pressure Alert",
            format!("BP reading: {} mmHg - {}", reading, category.alert_detail()),
        )
        .with_vital(&vital.id);
        self.raise_alert(user, &alert).await?;
        warn!("{:?} blood pressure {} for user {}", category, reading, user.id);

        if let Some(token) = user.fcm_token.as_deref() {
            self.push_bp_warning(user, token, &reading).await;
        }

        Ok(Some(alert))
    }

    async fn blood_sugar_alert(&self, user: &User, vital: &Vital) -> Result<Alert, ServiceError> {
        let alert_type = if vital.value > SUGAR_CRITICAL_ABOVE {
            AlertType::Critical
        } else {
            AlertType::Warning
        };
        let alert = Alert::new(
            &user.id,
            user.provider_id.as_deref(),
            alert_type,
            "Elevated Blood Sugar",
            format!("Blood sugar reading: {} mg/dL", format_number(vital.value)),
        )
        .with_vital(&vital.id);
        self.raise_alert(user, &alert).await?;
        warn!("Elevated blood sugar {} for user {}", vital.value, user.id);
        Ok(alert)
    }

    /// Store the alert and tell the assigned provider
    async fn raise_alert(&self, user: &User, alert: &Alert) -> Result<(), ServiceError> {
        self.repos.alerts.create(convert_to_data_alert(alert)).await?;
        if let Some(provider_id) = user.provider_id.as_deref() {
            self.hub.to_user(
                provider_id,
                NEW_ALERT,
                json!({
                    "alert": alert,
                    "patient": { "id": user.id, "name": user.name },
                }),
            );
        }
        Ok(())
    }

    /// Push failures never fail the request
    async fn push_bp_warning(&self, user: &User, token: &str, reading: &str) {
        if !self.push.is_enabled() {
            debug!("Push disabled, skipping BP warning for user {}", user.id);
            return;
        }
        let message = PushMessage::new(
            "⚠️ High BP Alert",
            format!("Your BP reading of {} is elevated. Please rest and re-measure.", reading),
        )
        .with_data("type", "bp_alert")
        .with_data("value", reading);

        match self.push.send_to_token(token, &message).await {
            Ok(message_id) => info!("Sent BP push {} to user {}", message_id, user.id),
            Err(e) => warn!("Failed to send BP push to user {}: {}", user.id, e),
        }
    }

    /// Rescore the active pregnancy from the latest BP and blood sugar
    async fn recompute_risk(&self, user: &User) -> Result<Option<u32>, ServiceError> {
        let Some(mut pregnancy) = active_pregnancy(&self.repos, &user.id).await? else {
            return Ok(None);
        };

        let bp = self
            .repos
            .vitals
            .latest(&user.id, VitalType::Bp.as_str())
            .await?
            .map(|v| BpReading { systolic: v.value, diastolic: v.secondary_value });
        let sugar = self
            .repos
            .vitals
            .latest(&user.id, VitalType::BloodSugar.as_str())
            .await?
            .map(|v| v.value);

        let assessment = risk::assess(bp, sugar);
        pregnancy.apply_assessment(&assessment, Utc::now());
        self.repos.pregnancies.update(convert_to_data_pregnancy(&pregnancy)).await?;
        info!("Pregnancy risk for user {} is now {} ({})", user.id, pregnancy.risk_score, pregnancy.risk_level);

        Ok(Some(pregnancy.risk_score))
    }

    /// History since `days` ago, newest first
    pub async fn history(
        &self,
        user: &User,
        vital_type: Option<&str>,
        days: Option<i64>,
    ) -> Result<Vec<Vital>, ServiceError> {
        let vital_type = match vital_type.filter(|t| !t.is_empty()) {
            Some(t) => Some(
                t.parse::<VitalType>()
                    .map_err(|_| ServiceError::Validation(format!("Invalid vital type: {}", t)))?,
            ),
            None => None,
        };
        let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
        if !(1..=3650).contains(&days) {
            return Err(ServiceError::Validation("Days must be between 1 and 3650".to_string()));
        }

        let query = VitalQuery {
            vital_type: vital_type.map(|t| t.as_str().to_string()),
            since: Some(format_timestamp(Utc::now() - Duration::days(days))),
            newest_first: true,
            limit: Some(HISTORY_LIMIT),
            ..VitalQuery::for_user(user.id.as_str())
        };
        Ok(convert_all(self.repos.vitals.list(query).await?, convert_to_domain_vital)?)
    }

    pub async fn latest(&self, user: &User) -> Result<LatestVitals, ServiceError> {
        let mut latest = LatestVitals::default();
        for vital_type in [VitalType::Bp, VitalType::Weight, VitalType::BloodSugar, VitalType::Temperature] {
            let vital = match self.repos.vitals.latest(&user.id, vital_type.as_str()).await? {
                Some(record) => Some(convert_to_domain_vital(record)?),
                None => None,
            };
            match vital_type {
                VitalType::Bp => latest.bp = vital,
                VitalType::Weight => latest.weight = vital,
                VitalType::BloodSugar => latest.blood_sugar = vital,
                _ => latest.temperature = vital,
            }
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Role, RiskLevel};
    use crate::notify::push::MockPushNotifier;
    use crate::notify::{Audience, DisabledPushNotifier};
    use crate::services::test_support::{insert_user, make_pregnant, repositories};
    use mom_care_data::repository::AlertQuery;

    fn request(vital_type: &str, value: f64, secondary: Option<f64>) -> LogVitalRequest {
        LogVitalRequest {
            vital_type: vital_type.to_string(),
            value,
            secondary_value: secondary,
            unit: None,
            notes: None,
        }
    }

    fn disabled() -> Arc<dyn PushNotifier> {
        Arc::new(DisabledPushNotifier)
    }

    #[tokio::test]
    async fn test_normal_bp_creates_no_alert() {
        let repos = repositories();
        let user = insert_user(&repos, "calm@example.com", Role::Patient, None).await;
        let service = VitalsService::new(repos.clone(), RealtimeHub::default(), disabled());

        let outcome = service.log(&user, request("bp", 118.0, Some(76.0))).await.unwrap();
        assert!(outcome.alert.is_none());
        assert!(outcome.risk_score.is_none());
        assert_eq!(outcome.vital.unit, "mmHg");
    }

    #[tokio::test]
    async fn test_severe_bp_alerts_provider_and_pushes() {
        let repos = repositories();
        let provider = insert_user(&repos, "doc@example.com", Role::Provider, None).await;
        let mut patient = insert_user(&repos, "high@example.com", Role::Patient, Some(&provider.id)).await;
        patient.fcm_token = Some("device-1".to_string());

        let mut push = MockPushNotifier::new();
        push.expect_is_enabled().return_const(true);
        push.expect_send_to_token()
            .withf(|token, message| {
                token == "device-1"
                    && message.body == "Your BP reading of 165/102 is elevated. Please rest and re-measure."
                    && message.data.get("type").map(String::as_str) == Some("bp_alert")
            })
            .times(1)
            .returning(|_, _| Ok("msg-1".to_string()));

        let hub = RealtimeHub::default();
        let mut events = hub.subscribe();
        let service = VitalsService::new(repos.clone(), hub, Arc::new(push));

        let outcome = service.log(&patient, request("bp", 165.0, Some(102.0))).await.unwrap();
        let alert = outcome.alert.unwrap();
        assert_eq!(alert.alert_type, AlertType::Critical);
        assert_eq!(alert.message, "BP reading: 165/102 mmHg - Severely elevated");
        assert_eq!(alert.vital_id.as_deref(), Some(outcome.vital.id.as_str()));

        let event = events.recv().await.unwrap();
        assert_eq!(event.audience, Audience::User(provider.id.clone()));
        assert_eq!(event.event, NEW_ALERT);
        assert_eq!(event.data["patient"]["name"], "high");

        let stored = repos
            .alerts
            .list(AlertQuery { provider_id: Some(provider.id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_push_failure_does_not_fail_request() {
        let repos = repositories();
        let mut patient = insert_user(&repos, "pushfail@example.com", Role::Patient, None).await;
        patient.fcm_token = Some("device-2".to_string());

        let mut push = MockPushNotifier::new();
        push.expect_is_enabled().return_const(true);
        push.expect_send_to_token()
            .times(1)
            .returning(|_, _| Err(crate::notify::PushError::Transport("gateway down".into())));
        let service = VitalsService::new(repos, RealtimeHub::default(), Arc::new(push));

        let outcome = service.log(&patient, request("bp", 145.0, None)).await.unwrap();
        let alert = outcome.alert.unwrap();
        assert_eq!(alert.alert_type, AlertType::Warning);
        assert_eq!(alert.message, "BP reading: 145/80 mmHg - Above normal threshold");
    }

    #[tokio::test]
    async fn test_blood_sugar_thresholds() {
        let repos = repositories();
        let user = insert_user(&repos, "sugar@example.com", Role::Patient, None).await;
        let service = VitalsService::new(repos, RealtimeHub::default(), disabled());

        assert!(service.log(&user, request("bloodSugar", 120.0, None)).await.unwrap().alert.is_none());
        let warning = service.log(&user, request("bloodSugar", 150.0, None)).await.unwrap().alert.unwrap();
        assert_eq!(warning.alert_type, AlertType::Warning);
        assert_eq!(warning.title, "Elevated Blood Sugar");
        let critical = service.log(&user, request("bloodSugar", 181.0, None)).await.unwrap().alert.unwrap();
        assert_eq!(critical.alert_type, AlertType::Critical);
        assert_eq!(critical.message, "Blood sugar reading: 181 mg/dL");
    }

    #[tokio::test]
    async fn test_risk_recomputed_in_pregnancy_mode_keeping_other_factors() {
        let repos = repositories();
        let mut user = insert_user(&repos, "risk@example.com", Role::Patient, None).await;
        make_pregnant(&repos, &mut user, 28).await;

        add_factor(&repos, &user.id, "Decreased fetal movement").await;

        let service = VitalsService::new(repos.clone(), RealtimeHub::default(), disabled());
        let outcome = service.log(&user, request("bp", 150.0, Some(95.0))).await.unwrap();
        assert_eq!(outcome.risk_score, Some(55));

        let outcome = service.log(&user, request("bloodSugar", 190.0, None)).await.unwrap();
        assert_eq!(outcome.risk_score, Some(80));

        let stored = active_pregnancy(&repos, &user.id).await.unwrap().unwrap();
        assert_eq!(stored.risk_level, RiskLevel::High);
        let factors: Vec<&str> = stored.risk_factors.iter().map(|f| f.factor.as_str()).collect();
        assert!(factors.contains(&"Decreased fetal movement"));
        assert!(factors.contains(&risk::HIGH_BP_FACTOR));
        assert!(factors.contains(&risk::HIGH_SUGAR_FACTOR));
        assert_eq!(factors.len(), 3);
    }

    async fn add_factor(repos: &Repositories, user_id: &str, factor: &str) {
        let mut pregnancy = active_pregnancy(repos, user_id).await.unwrap().unwrap();
        pregnancy.risk_factors.push(crate::entities::RiskFactor {
            factor: factor.to_string(),
            severity: crate::entities::Severity::Medium,
            added_at: Utc::now(),
        });
        repos.pregnancies.update(convert_to_data_pregnancy(&pregnancy)).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_bad_readings() {
        let repos = repositories();
        let user = insert_user(&repos, "bad@example.com", Role::Patient, None).await;
        let service = VitalsService::new(repos, RealtimeHub::default(), disabled());

        for bad in [
            request("pulse", 80.0, None),
            request("bp", 20.0, Some(70.0)),
            request("bp", 120.0, Some(250.0)),
            request("contraction", 60.0, Some(12.0)),
            request("weight", f64::INFINITY, None),
        ] {
            assert!(matches!(service.log(&user, bad).await, Err(ServiceError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_history_and_latest() {
        let repos = repositories();
        let user = insert_user(&repos, "history@example.com", Role::Patient, None).await;
        let service = VitalsService::new(repos, RealtimeHub::default(), disabled());

        service.log(&user, request("weight", 64.0, None)).await.unwrap();
        service.log(&user, request("weight", 64.5, None)).await.unwrap();
        service.log(&user, request("bp", 118.0, Some(75.0))).await.unwrap();

        let weights = service.history(&user, Some("weight"), None).await.unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].value, 64.5);
        assert_eq!(service.history(&user, None, Some(7)).await.unwrap().len(), 3);
        assert!(matches!(service.history(&user, Some("mood"), None).await, Err(ServiceError::Validation(_))));

        let latest = service.latest(&user).await.unwrap();
        assert_eq!(latest.weight.map(|v| v.value), Some(64.5));
        assert!(latest.bp.is_some());
        assert!(latest.blood_sugar.is_none());
    }
}
