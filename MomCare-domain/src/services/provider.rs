//! Provider and clinic views over patients, alerts and messages

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use mom_care_data::models::format_timestamp;
use mom_care_data::repository::{AlertQuery, AlertScope, PatientFilter, Repositories, VitalQuery};

use super::{active_pregnancy, ServiceError};
use crate::clinical::gestation;
use crate::entities::conversions::{
    convert_all, convert_to_data_alert, convert_to_data_message, convert_to_domain_alert,
    convert_to_domain_message, convert_to_domain_user, convert_to_domain_vital,
};
use crate::entities::{
    Alert, AlertType, BloodType, Message, Mode, Pregnancy, RiskFactor, RiskLevel, Role, User, Vital,
    VitalType,
};
use crate::notify::realtime::{DASHBOARD_UPDATE, NEW_ALERT, NEW_MESSAGE};
use crate::notify::RealtimeHub;

const PROVIDER_ALERT_LIMIT: usize = 100;
const RECENT_ALERT_LIMIT: usize = 5;
const DETAIL_ALERT_LIMIT: usize = 10;
const RECENT_LOG_LIMIT: usize = 10;
const CHART_DAYS: i64 = 30;
const CONVERSATION_LIMIT: usize = 100;

/// Whose patients a request may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClinicScope {
    /// Patients assigned to one provider
    Provider(String),
    /// Every patient of the clinic
    Clinic,
}

impl ClinicScope {
    pub fn for_provider(user: &User) -> Self {
        ClinicScope::Provider(user.id.clone())
    }

    fn provider_id(&self) -> Option<&str> {
        match self {
            ClinicScope::Provider(id) => Some(id),
            ClinicScope::Clinic => None,
        }
    }

    fn includes(&self, patient: &User) -> bool {
        patient.role == Role::Patient
            && match self {
                ClinicScope::Provider(id) => patient.provider_id.as_deref() == Some(id.as_str()),
                ClinicScope::Clinic => true,
            }
    }
}

/// One row of the patient list
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub mode: Mode,
    pub week: Option<i64>,
    pub trimester: Option<u8>,
    pub due_date: Option<DateTime<Utc>>,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
    #[serde(rename = "latestBP")]
    pub latest_bp: Option<String>,
    pub latest_weight: Option<f64>,
    pub last_vitals_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PatientList {
    pub patients: Vec<PatientSummary>,
    pub total: usize,
    pub high_risk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PatientRef {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for PatientRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// An alert with the patient it concerns
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct AlertWithPatient {
    #[serde(flatten)]
    pub alert: Alert,
    pub patient: Option<PatientRef>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProviderAlerts {
    pub alerts: Vec<AlertWithPatient>,
    pub unread_count: i64,
    /// Critical and unread, among the listed alerts
    pub critical_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: i64,
    pub high_risk_count: i64,
    pub unread_alerts: i64,
    pub appointments_today: i64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_alerts: Vec<AlertWithPatient>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub medical_conditions: Vec<String>,
    pub allergies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PregnancySnapshot {
    pub current_week: i64,
    pub trimester: u8,
    pub due_date: DateTime<Utc>,
    pub days_remaining: i64,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
    pub baby_size_comparison: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VitalGroups {
    pub bp: Vec<Vital>,
    pub weight: Vec<Vital>,
    pub blood_sugar: Vec<Vital>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct BpPoint {
    /// `Mon D`
    pub date: String,
    pub systolic: f64,
    pub diastolic: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct WeightPoint {
    pub date: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LogEntry {
    /// `YYYY-MM-DD HH:MM`
    pub date: String,
    #[serde(rename = "type")]
    pub label: String,
    pub value: String,
    /// `warning` or `normal`
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PatientDetail {
    pub patient: PatientProfile,
    pub pregnancy: Option<PregnancySnapshot>,
    pub vitals: VitalGroups,
    pub bp_data: Vec<BpPoint>,
    pub weight_data: Vec<WeightPoint>,
    pub recent_logs: Vec<LogEntry>,
    pub alerts: Vec<Alert>,
}

/// Patient and alert created by the demo simulation
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SimulatedAlert {
    pub patient: PatientRef,
    pub alert: Alert,
}

fn log_status(vital: &Vital) -> &'static str {
    let high = vital.vital_type == VitalType::Bp
        && (vital.value > 140.0 || vital.secondary_value.is_some_and(|d| d > 90.0));
    if high {
        "warning"
    } else {
        "normal"
    }
}

/// Chart series and log entries from chronological vitals
fn chart_data(
    vitals: &[Vital],
    pregnancy: Option<&Pregnancy>,
) -> (Vec<BpPoint>, Vec<WeightPoint>, Vec<LogEntry>) {
    let bp_data = vitals
        .iter()
        .filter(|v| v.vital_type == VitalType::Bp)
        .map(|v| BpPoint {
            date: v.date.format("%b %-d").to_string(),
            systolic: v.value,
            diastolic: v.secondary_value,
        })
        .collect();

    let weight_data = vitals
        .iter()
        .filter(|v| v.vital_type == VitalType::Weight)
        .map(|v| WeightPoint {
            date: match pregnancy {
                Some(p) => format!("Week {}", gestation::current_week(p.last_menstrual_period, v.date)),
                None => v.date.format("%Y-%m-%d").to_string(),
            },
            weight: v.value,
        })
        .collect();

    let recent_logs = vitals
        .iter()
        .rev()
        .take(RECENT_LOG_LIMIT)
        .map(|v| LogEntry {
            date: v.date.format("%Y-%m-%d %H:%M").to_string(),
            label: v.vital_type.label().to_string(),
            value: v.display_value(),
            status: log_status(v).to_string(),
        })
        .collect();

    (bp_data, weight_data, recent_logs)
}

fn parse_risk_filter(risk: Option<&str>) -> Result<Option<RiskLevel>, ServiceError> {
    match risk.map(str::trim).filter(|r| !r.is_empty() && *r != "all") {
        Some(level) => level
            .parse::<RiskLevel>()
            .map(Some)
            .map_err(|_| ServiceError::Validation(format!("Invalid risk level: {}", level))),
        None => Ok(None),
    }
}

fn parse_alert_type(alert_type: Option<&str>) -> Result<Option<AlertType>, ServiceError> {
    match alert_type.map(str::trim).filter(|t| !t.is_empty() && *t != "all") {
        Some(t) => t
            .parse::<AlertType>()
            .map(Some)
            .map_err(|_| ServiceError::Validation(format!("Invalid alert type: {}", t))),
        None => Ok(None),
    }
}

/// Provider dashboards, scoped to a panel or to the whole clinic
pub struct ProviderService {
    repos: Repositories,
    hub: RealtimeHub,
    simulation_enabled: bool,
}

impl ProviderService {
    pub fn new(repos: Repositories, hub: RealtimeHub, simulation_enabled: bool) -> Self {
        Self { repos, hub, simulation_enabled }
    }

    async fn patient_in_scope(&self, scope: &ClinicScope, patient_id: &str) -> Result<User, ServiceError> {
        let not_found = || ServiceError::NotFound("Patient not found".to_string());
        let record = self.repos.users.find_by_id(patient_id).await?.ok_or_else(not_found)?;
        let patient = convert_to_domain_user(record)?;
        if scope.includes(&patient) {
            Ok(patient)
        } else {
            Err(not_found())
        }
    }

    async fn summarize(&self, patient: User, now: DateTime<Utc>) -> Result<PatientSummary, ServiceError> {
        let pregnancy = active_pregnancy(&self.repos, &patient.id).await?;
        let latest_bp = self.repos.vitals.latest(&patient.id, VitalType::Bp.as_str()).await?;
        let latest_weight = self.repos.vitals.latest(&patient.id, VitalType::Weight.as_str()).await?;
        let latest_bp = latest_bp.map(convert_to_domain_vital).transpose()?;
        let latest_weight = latest_weight.map(convert_to_domain_vital).transpose()?;

        Ok(PatientSummary {
            week: pregnancy.as_ref().map(|p| p.current_week(now)),
            trimester: pregnancy.as_ref().map(|p| p.trimester(now)),
            due_date: pregnancy.as_ref().map(|p| p.due_date),
            risk_score: pregnancy.as_ref().map_or(0, |p| p.risk_score),
            risk_level: pregnancy.as_ref().map_or(RiskLevel::Low, |p| p.risk_level),
            risk_factors: pregnancy.map(|p| p.risk_factors).unwrap_or_default(),
            last_vitals_date: latest_bp.as_ref().or(latest_weight.as_ref()).map(|v| v.date),
            latest_bp: latest_bp.as_ref().map(Vital::bp_text),
            latest_weight: latest_weight.map(|v| v.value),
            id: patient.id,
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
            mode: patient.current_mode,
        })
    }

    /// Sorted by risk score, highest first
    pub async fn patients(
        &self,
        scope: &ClinicScope,
        risk: Option<&str>,
        search: Option<&str>,
    ) -> Result<PatientList, ServiceError> {
        let risk = parse_risk_filter(risk)?;
        let filter = PatientFilter {
            provider_id: scope.provider_id().map(str::to_string),
            name_contains: search.map(str::to_string),
        };
        let patients = convert_all(self.repos.users.list_patients(filter).await?, convert_to_domain_user)?;

        let now = Utc::now();
        let mut rows = Vec::with_capacity(patients.len());
        for patient in patients {
            rows.push(self.summarize(patient, now).await?);
        }
        if let Some(level) = risk {
            rows.retain(|row| row.risk_level == level);
        }
        rows.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));

        let high_risk_count = rows.iter().filter(|row| row.risk_level == RiskLevel::High).count();
        Ok(PatientList {
            total: rows.len(),
            high_risk_count,
            patients: rows,
        })
    }

    pub async fn patient_detail(&self, scope: &ClinicScope, patient_id: &str) -> Result<PatientDetail, ServiceError> {
        let patient = self.patient_in_scope(scope, patient_id).await?;
        let pregnancy = active_pregnancy(&self.repos, &patient.id).await?;
        let now = Utc::now();

        let query = VitalQuery {
            since: Some(format_timestamp(now - Duration::days(CHART_DAYS))),
            newest_first: false,
            ..VitalQuery::for_user(patient.id.as_str())
        };
        let vitals = convert_all(self.repos.vitals.list(query).await?, convert_to_domain_vital)?;
        let (bp_data, weight_data, recent_logs) = chart_data(&vitals, pregnancy.as_ref());

        let mut groups = VitalGroups::default();
        for vital in vitals.into_iter().rev() {
            match vital.vital_type {
                VitalType::Bp => groups.bp.push(vital),
                VitalType::Weight => groups.weight.push(vital),
                VitalType::BloodSugar => groups.blood_sugar.push(vital),
                _ => {}
            }
        }

        let alerts = AlertQuery {
            patient_id: Some(patient.id.clone()),
            limit: Some(DETAIL_ALERT_LIMIT),
            ..Default::default()
        };
        let alerts = convert_all(self.repos.alerts.list(alerts).await?, convert_to_domain_alert)?;

        Ok(PatientDetail {
            pregnancy: pregnancy.map(|p| PregnancySnapshot {
                current_week: p.current_week(now),
                trimester: p.trimester(now),
                due_date: p.due_date,
                days_remaining: p.days_remaining(now),
                risk_score: p.risk_score,
                risk_level: p.risk_level,
                baby_size_comparison: p.baby_size_comparison(now).to_string(),
                risk_factors: p.risk_factors,
            }),
            patient: PatientProfile {
                id: patient.id,
                name: patient.name,
                email: patient.email,
                age: patient.age,
                phone: patient.phone,
                blood_type: patient.blood_type,
                medical_conditions: patient.medical_conditions,
                allergies: patient.allergies,
            },
            vitals: groups,
            bp_data,
            weight_data,
            recent_logs,
            alerts,
        })
    }

    /// Attach patient name and email to each alert
    async fn with_patients(&self, alerts: Vec<Alert>) -> Result<Vec<AlertWithPatient>, ServiceError> {
        let mut patients: HashMap<String, Option<PatientRef>> = HashMap::new();
        let mut enriched = Vec::with_capacity(alerts.len());
        for alert in alerts {
            if !patients.contains_key(&alert.patient_id) {
                let patient = match self.repos.users.find_by_id(&alert.patient_id).await? {
                    Some(record) => Some(PatientRef::from(&convert_to_domain_user(record)?)),
                    None => None,
                };
                patients.insert(alert.patient_id.clone(), patient);
            }
            let patient = patients.get(&alert.patient_id).cloned().flatten();
            enriched.push(AlertWithPatient { alert, patient });
        }
        Ok(enriched)
    }

    pub async fn alerts(
        &self,
        scope: &ClinicScope,
        alert_type: Option<&str>,
        unread_only: bool,
    ) -> Result<ProviderAlerts, ServiceError> {
        let alert_type = parse_alert_type(alert_type)?;
        let query = AlertQuery {
            provider_id: scope.provider_id().map(str::to_string),
            alert_type: alert_type.map(|t| t.as_str().to_string()),
            unread_only,
            limit: Some(PROVIDER_ALERT_LIMIT),
            ..Default::default()
        };
        let alerts = convert_all(self.repos.alerts.list(query).await?, convert_to_domain_alert)?;
        let critical_count = alerts
            .iter()
            .filter(|a| a.alert_type == AlertType::Critical && !a.is_read)
            .count();
        let unread_count = self.repos.alerts.count_unread(scope.provider_id()).await?;

        Ok(ProviderAlerts {
            alerts: self.with_patients(alerts).await?,
            unread_count,
            critical_count,
        })
    }

    pub async fn mark_alert_read(&self, scope: &ClinicScope, alert_id: &str) -> Result<Alert, ServiceError> {
        let alert_scope = AlertScope {
            patient_id: None,
            provider_id: scope.provider_id().map(str::to_string),
        };
        let record = self
            .repos
            .alerts
            .mark_read(alert_id, alert_scope, &format_timestamp(Utc::now()))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Alert not found".to_string()))?;
        info!("Alert {} marked read ({:?})", alert_id, scope);
        Ok(convert_to_domain_alert(record)?)
    }

    /// Both directions, chronological
    pub async fn conversation(&self, provider: &User, patient_id: &str) -> Result<Vec<Message>, ServiceError> {
        let records = self
            .repos
            .messages
            .conversation(&provider.id, patient_id, CONVERSATION_LIMIT)
            .await?;
        Ok(convert_all(records, convert_to_domain_message)?)
    }

    pub async fn send_message(&self, provider: &User, patient_id: &str, content: &str) -> Result<Message, ServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation("Message content required".to_string()));
        }
        let patient = self
            .patient_in_scope(&ClinicScope::for_provider(provider), patient_id)
            .await?;

        let message = Message::new(&provider.id, &patient.id, content, false);
        self.repos.messages.create(convert_to_data_message(&message)).await?;

        self.hub.to_user(
            &patient.id,
            NEW_MESSAGE,
            json!({
                "from": provider.name,
                "content": message.content,
                "createdAt": message.created_at,
            }),
        );
        info!("Provider {} messaged patient {}", provider.id, patient.id);
        Ok(message)
    }

    pub async fn dashboard(&self, scope: &ClinicScope) -> Result<Dashboard, ServiceError> {
        let provider_id = scope.provider_id();
        let stats = DashboardStats {
            total_patients: self.repos.users.count_patients(provider_id).await?,
            high_risk_count: self
                .repos
                .pregnancies
                .count_active_by_level(RiskLevel::High.as_str(), provider_id)
                .await?,
            unread_alerts: self.repos.alerts.count_unread(provider_id).await?,
            appointments_today: 0,
        };

        let query = AlertQuery {
            provider_id: provider_id.map(str::to_string),
            limit: Some(RECENT_ALERT_LIMIT),
            ..Default::default()
        };
        let recent = convert_all(self.repos.alerts.list(query).await?, convert_to_domain_alert)?;

        Ok(Dashboard {
            stats,
            recent_alerts: self.with_patients(recent).await?,
        })
    }

    /// Demo hook: raise a BP alert for a random patient
    pub async fn simulate(&self) -> Result<SimulatedAlert, ServiceError> {
        if !self.simulation_enabled {
            return Err(ServiceError::NotFound("Simulation is disabled".to_string()));
        }

        let patients = convert_all(
            self.repos.users.list_patients(PatientFilter::default()).await?,
            convert_to_domain_user,
        )?;
        let (patient, alert_type) = {
            let mut rng = rand::thread_rng();
            let patient = patients
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| ServiceError::NotFound("No patients to simulate".to_string()))?;
            let alert_type = *[AlertType::Critical, AlertType::Warning]
                .choose(&mut rng)
                .unwrap_or(&AlertType::Warning);
            (patient, alert_type)
        };

        let alert = Alert::new(
            &patient.id,
            patient.provider_id.as_deref(),
            alert_type,
            "Anomalous BP Detected",
            format!("Simulated live data: {} recorded BP 145/95 mmHg.", patient.name),
        );
        self.repos.alerts.create(convert_to_data_alert(&alert)).await?;

        let patient_ref = PatientRef::from(&patient);
        self.hub.to_clinic(NEW_ALERT, json!({ "alert": alert, "patient": patient_ref }));
        self.hub.to_clinic(DASHBOARD_UPDATE, json!({ "reason": "simulated-alert" }));
        warn!("Simulated {} alert for patient {}", alert_type, patient.id);

        Ok(SimulatedAlert { patient: patient_ref, alert })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::conversions::{convert_to_data_pregnancy, convert_to_data_vital};
    use crate::notify::Audience;
    use crate::services::test_support::{insert_user, make_pregnant, repositories};

    struct Clinic {
        repos: Repositories,
        provider: User,
        other_provider: User,
        high: User,
        low: User,
        stranger: User,
    }

    async fn clinic() -> Clinic {
        let repos = repositories();
        let provider = insert_user(&repos, "dr.a@example.com", Role::Provider, None).await;
        let other_provider = insert_user(&repos, "dr.b@example.com", Role::Provider, None).await;
        let mut high = insert_user(&repos, "priya@example.com", Role::Patient, Some(&provider.id)).await;
        let low = insert_user(&repos, "kavita@example.com", Role::Patient, Some(&provider.id)).await;
        let stranger = insert_user(&repos, "sneha@example.com", Role::Patient, Some(&other_provider.id)).await;

        let mut pregnancy = make_pregnant(&repos, &mut high, 32).await;
        pregnancy.set_score(78);
        repos.pregnancies.update(convert_to_data_pregnancy(&pregnancy)).await.unwrap();

        Clinic { repos, provider, other_provider, high, low, stranger }
    }

    fn service(clinic: &Clinic, hub: RealtimeHub) -> ProviderService {
        ProviderService::new(clinic.repos.clone(), hub, true)
    }

    async fn add_vital(repos: &Repositories, user: &User, vital_type: VitalType, value: f64, secondary: Option<f64>, days_ago: i64) {
        let mut vital = Vital::new(&user.id, vital_type, value, secondary);
        vital.date = Utc::now() - Duration::days(days_ago);
        repos.vitals.create(convert_to_data_vital(&vital)).await.unwrap();
    }

    #[tokio::test]
    async fn test_patient_list_is_scoped_and_sorted() {
        let clinic = clinic().await;
        let service = service(&clinic, RealtimeHub::default());
        add_vital(&clinic.repos, &clinic.high, VitalType::Bp, 150.0, Some(95.0), 1).await;

        let list = service.patients(&ClinicScope::for_provider(&clinic.provider), None, None).await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.high_risk_count, 1);
        assert_eq!(list.patients[0].id, clinic.high.id);
        assert_eq!(list.patients[0].latest_bp.as_deref(), Some("150/95"));
        assert_eq!(list.patients[0].week, Some(32));
        assert_eq!(list.patients[1].risk_score, 0);
        assert_eq!(list.patients[1].risk_level, RiskLevel::Low);
        assert!(list.patients[1].week.is_none());

        let searched = service
            .patients(&ClinicScope::for_provider(&clinic.provider), Some("all"), Some("KAV"))
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.patients[0].id, clinic.low.id);

        let high_only = service.patients(&ClinicScope::Clinic, Some("high"), None).await.unwrap();
        assert_eq!(high_only.total, 1);

        let everyone = service.patients(&ClinicScope::Clinic, None, None).await.unwrap();
        assert_eq!(everyone.total, 3);

        assert!(matches!(
            service.patients(&ClinicScope::Clinic, Some("extreme"), None).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_patient_detail_scope_and_charts() {
        let clinic = clinic().await;
        let service = service(&clinic, RealtimeHub::default());
        add_vital(&clinic.repos, &clinic.high, VitalType::Bp, 142.0, Some(91.0), 3).await;
        add_vital(&clinic.repos, &clinic.high, VitalType::Bp, 118.0, Some(76.0), 2).await;
        add_vital(&clinic.repos, &clinic.high, VitalType::Weight, 64.5, None, 1).await;
        add_vital(&clinic.repos, &clinic.high, VitalType::Bp, 120.0, Some(80.0), 45).await;

        let detail = service
            .patient_detail(&ClinicScope::for_provider(&clinic.provider), &clinic.high.id)
            .await
            .unwrap();
        assert_eq!(detail.patient.id, clinic.high.id);
        assert_eq!(detail.pregnancy.as_ref().map(|p| p.risk_score), Some(78));
        assert_eq!(detail.vitals.bp.len(), 2);
        assert_eq!(detail.bp_data.len(), 2);
        assert_eq!(detail.bp_data[0].systolic, 142.0);
        assert_eq!(detail.weight_data.len(), 1);
        assert!(detail.weight_data[0].date.starts_with("Week "));

        assert_eq!(detail.recent_logs.len(), 3);
        assert_eq!(detail.recent_logs[0].label, "Weight");
        assert_eq!(detail.recent_logs[0].value, "64.5 kg");
        assert_eq!(detail.recent_logs[2].value, "142/91 mmHg");
        assert_eq!(detail.recent_logs[2].status, "warning");
        assert_eq!(detail.recent_logs[1].status, "normal");

        match service
            .patient_detail(&ClinicScope::for_provider(&clinic.provider), &clinic.stranger.id)
            .await
        {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "Patient not found"),
            other => panic!("expected not found, got {:?}", other.map(|d| d.patient.id)),
        }
        assert!(service.patient_detail(&ClinicScope::Clinic, &clinic.stranger.id).await.is_ok());
        assert!(service.patient_detail(&ClinicScope::Clinic, &clinic.provider.id).await.is_err());
    }

    #[tokio::test]
    async fn test_alerts_counts_and_mark_read() {
        let clinic = clinic().await;
        let service = service(&clinic, RealtimeHub::default());

        let critical = Alert::new(&clinic.high.id, Some(&clinic.provider.id), AlertType::Critical, "BP", "165/105");
        let warning = Alert::new(&clinic.low.id, Some(&clinic.provider.id), AlertType::Warning, "Sugar", "150");
        let foreign = Alert::new(&clinic.stranger.id, Some(&clinic.other_provider.id), AlertType::Critical, "BP", "170/110");
        for alert in [&critical, &warning, &foreign] {
            clinic.repos.alerts.create(convert_to_data_alert(alert)).await.unwrap();
        }

        let scope = ClinicScope::for_provider(&clinic.provider);
        let alerts = service.alerts(&scope, None, false).await.unwrap();
        assert_eq!(alerts.alerts.len(), 2);
        assert_eq!(alerts.unread_count, 2);
        assert_eq!(alerts.critical_count, 1);
        assert!(alerts.alerts.iter().all(|a| a.patient.is_some()));

        let only_critical = service.alerts(&scope, Some("critical"), false).await.unwrap();
        assert_eq!(only_critical.alerts.len(), 1);

        assert!(matches!(
            service.mark_alert_read(&scope, &foreign.id).await,
            Err(ServiceError::NotFound(_))
        ));
        let read = service.mark_alert_read(&scope, &critical.id).await.unwrap();
        assert!(read.is_read);

        let after = service.alerts(&scope, None, true).await.unwrap();
        assert_eq!(after.alerts.len(), 1);
        assert_eq!(after.critical_count, 0);

        let clinic_wide = service.dashboard(&ClinicScope::Clinic).await.unwrap();
        assert_eq!(clinic_wide.stats.total_patients, 3);
        assert_eq!(clinic_wide.stats.unread_alerts, 2);
        assert_eq!(clinic_wide.stats.high_risk_count, 1);
        assert_eq!(clinic_wide.recent_alerts.len(), 3);
    }

    #[tokio::test]
    async fn test_messages_require_assignment_and_notify_patient() {
        let clinic = clinic().await;
        let hub = RealtimeHub::default();
        let mut events = hub.subscribe();
        let service = service(&clinic, hub);

        assert!(matches!(
            service.send_message(&clinic.provider, &clinic.stranger.id, "Hello").await,
            Err(ServiceError::NotFound(_))
        ));

        let message = service.send_message(&clinic.provider, &clinic.high.id, "Please rest").await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.audience, Audience::User(clinic.high.id.clone()));
        assert_eq!(event.event, NEW_MESSAGE);
        assert_eq!(event.data["content"], "Please rest");

        let conversation = service.conversation(&clinic.provider, &clinic.high.id).await.unwrap();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0].id, message.id);
    }

    #[tokio::test]
    async fn test_simulate_alerts_the_clinic() {
        let clinic = clinic().await;
        let hub = RealtimeHub::default();
        let mut events = hub.subscribe();
        let service = service(&clinic, hub.clone());

        let simulated = service.simulate().await.unwrap();
        assert!(simulated.alert.message.starts_with("Simulated live data: "));
        assert!(matches!(simulated.alert.alert_type, AlertType::Critical | AlertType::Warning));

        let first = events.recv().await.unwrap();
        assert_eq!(first.audience, Audience::Clinic);
        assert_eq!(first.event, NEW_ALERT);
        assert_eq!(events.recv().await.unwrap().event, DASHBOARD_UPDATE);

        let disabled = ProviderService::new(clinic.repos.clone(), hub, false);
        assert!(matches!(disabled.simulate().await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_simulate_without_patients() {
        let service = ProviderService::new(repositories(), RealtimeHub::default(), true);
        match service.simulate().await {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "No patients to simulate"),
            other => panic!("expected not found, got {:?}", other.map(|s| s.patient)),
        }
    }
}
