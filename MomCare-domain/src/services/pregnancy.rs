use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use mom_care_data::models::format_timestamp;
use mom_care_data::repository::{Repositories, VitalQuery};

use super::{active_pregnancy, validate_request, ServiceError};
use crate::clinical::{gestation, kicks, labor, risk, Contraction};
use crate::entities::conversions::{
    convert_all, convert_to_data_pregnancy, convert_to_data_user, convert_to_data_vital,
    convert_to_domain_vital,
};
use crate::entities::vital::format_number;
use crate::entities::{Mode, Pregnancy, PregnancyDetails, RiskFactor, RiskLevel, User, Vital, VitalType};

const NO_ACTIVE_PREGNANCY: &str = "No active pregnancy found";

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct KickRequest {
    pub count: u32,
    /// Session length in minutes
    #[validate(range(min = 0.1, max = 720.0, message = "Duration must be between 0.1 and 720 minutes"))]
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ContractionRequest {
    /// Seconds
    #[validate(range(min = 1.0, max = 600.0, message = "Duration must be between 1 and 600 seconds"))]
    pub duration: f64,
    #[validate(range(min = 1.0, max = 10.0, message = "Intensity must be between 1 and 10"))]
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct KickOutcome {
    /// One decimal
    pub kicks_per_hour: f64,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ContractionOutcome {
    pub contractions_in_last_hour: usize,
    pub labor_warning: Option<String>,
}

/// Vitals logged over the last seven days
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub bp_readings: i64,
    pub weight_readings: i64,
    pub kick_sessions: i64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PregnancyStats {
    pub current_week: i64,
    pub trimester: u8,
    pub days_remaining: i64,
    pub due_date: DateTime<Utc>,
    pub baby_size: String,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
    pub weekly_stats: WeeklyStats,
}

/// Parse a required LMP given as RFC 3339 or `YYYY-MM-DD`
pub(crate) fn parse_lmp(value: Option<&str>) -> Result<DateTime<Utc>, ServiceError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Validation("Last menstrual period date required".to_string()))?;
    gestation::parse_date(value)
        .ok_or_else(|| ServiceError::Validation(format!("Invalid date: {}", value)))
}

/// Replace any pregnancy of `user` with a new active one and put the user in pregnancy mode
pub(crate) async fn start_pregnancy(
    repos: &Repositories,
    user: &mut User,
    lmp: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Pregnancy, ServiceError> {
    gestation::validate_lmp(lmp, now).map_err(ServiceError::Validation)?;

    let replaced = repos.pregnancies.deactivate_for_user(&user.id).await?;
    if replaced > 0 {
        info!("Deactivated {} earlier pregnancies for user {}", replaced, user.id);
    }

    let pregnancy = Pregnancy::start(&user.id, lmp, now);
    repos.pregnancies.create(convert_to_data_pregnancy(&pregnancy)).await?;

    user.current_mode = Mode::Pregnancy;
    user.last_menstrual_period = Some(lmp);
    repos.users.update(convert_to_data_user(user)).await?;

    Ok(pregnancy)
}

/// Pregnancy records, kick counts and contraction timing
pub struct PregnancyService {
    repos: Repositories,
}

impl PregnancyService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn require_active(&self, user_id: &str) -> Result<Pregnancy, ServiceError> {
        active_pregnancy(&self.repos, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NO_ACTIVE_PREGNANCY.to_string()))
    }

    pub async fn current(&self, user: &User) -> Result<PregnancyDetails, ServiceError> {
        Ok(self.require_active(&user.id).await?.details(Utc::now()))
    }

    pub async fn start(
        &self,
        mut user: User,
        last_menstrual_period: Option<&str>,
    ) -> Result<PregnancyDetails, ServiceError> {
        let lmp = parse_lmp(last_menstrual_period)?;
        let now = Utc::now();
        let pregnancy = start_pregnancy(&self.repos, &mut user, lmp, now).await?;
        info!("Started pregnancy {} for user {}", pregnancy.id, user.id);
        Ok(pregnancy.details(now))
    }

    pub async fn log_kicks(&self, user: &User, request: KickRequest) -> Result<KickOutcome, ServiceError> {
        validate_request(&request)?;
        let mut pregnancy = self.require_active(&user.id).await?;

        let mut vital = Vital::new(&user.id, VitalType::FetalMovement, f64::from(request.count), Some(request.duration));
        vital.notes = Some(format!("{} kicks in {} minutes", request.count, format_number(request.duration)));
        self.repos.vitals.create(convert_to_data_vital(&vital)).await?;

        let assessment = kicks::assess(request.count, request.duration);
        let warning = match assessment.concern {
            Some(severity) => {
                warn!("Low fetal movement for user {}: {:.1} kicks/hour", user.id, assessment.kicks_per_hour);
                if !pregnancy.has_factor_containing("fetal movement") {
                    pregnancy.risk_factors.push(RiskFactor {
                        factor: kicks::DECREASED_MOVEMENT_FACTOR.to_string(),
                        severity,
                        added_at: Utc::now(),
                    });
                    pregnancy.set_score(risk::raise_score(pregnancy.risk_score, kicks::DECREASED_MOVEMENT_PENALTY));
                    self.repos.pregnancies.update(convert_to_data_pregnancy(&pregnancy)).await?;
                }
                Some(kicks::LOW_KICKS_WARNING.to_string())
            }
            None => None,
        };

        Ok(KickOutcome {
            kicks_per_hour: kicks::round_rate(assessment.kicks_per_hour),
            warning,
        })
    }

    pub async fn log_contraction(
        &self,
        user: &User,
        request: ContractionRequest,
    ) -> Result<ContractionOutcome, ServiceError> {
        validate_request(&request)?;

        let mut vital = Vital::new(&user.id, VitalType::Contraction, request.duration, Some(request.intensity));
        vital.notes = Some(format!(
            "Contraction: {}s, intensity {}/10",
            format_number(request.duration),
            format_number(request.intensity)
        ));
        self.repos.vitals.create(convert_to_data_vital(&vital)).await?;

        let now = Utc::now();
        let query = VitalQuery {
            vital_type: Some(VitalType::Contraction.as_str().to_string()),
            since: Some(format_timestamp(labor::window_start(now))),
            ..VitalQuery::for_user(user.id.as_str())
        };
        let recent = convert_all(self.repos.vitals.list(query).await?, convert_to_domain_vital)?;
        let contractions: Vec<Contraction> = recent
            .iter()
            .map(|v| Contraction { at: v.date, duration_secs: v.value })
            .collect();

        let assessment = labor::evaluate_five_one_one(&contractions, now);
        if assessment.labor_likely {
            warn!("Contraction pattern for user {} matches the 5-1-1 rule", user.id);
        }

        Ok(ContractionOutcome {
            contractions_in_last_hour: assessment.contractions_in_window,
            labor_warning: assessment.labor_likely.then(|| labor::LABOR_WARNING.to_string()),
        })
    }

    pub async fn stats(&self, user: &User) -> Result<PregnancyStats, ServiceError> {
        let pregnancy = self.require_active(&user.id).await?;
        let now = Utc::now();
        let since = format_timestamp(now - Duration::days(7));

        let weekly_stats = WeeklyStats {
            bp_readings: self.repos.vitals.count(&user.id, VitalType::Bp.as_str(), &since).await?,
            weight_readings: self.repos.vitals.count(&user.id, VitalType::Weight.as_str(), &since).await?,
            kick_sessions: self.repos.vitals.count(&user.id, VitalType::FetalMovement.as_str(), &since).await?,
        };

        Ok(PregnancyStats {
            current_week: pregnancy.current_week(now),
            trimester: pregnancy.trimester(now),
            days_remaining: pregnancy.days_remaining(now),
            due_date: pregnancy.due_date,
            baby_size: pregnancy.baby_size_comparison(now).to_string(),
            risk_score: pregnancy.risk_score,
            risk_level: pregnancy.risk_level,
            risk_factors: pregnancy.risk_factors,
            weekly_stats,
        })
    }
}
