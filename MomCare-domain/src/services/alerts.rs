use chrono::Utc;
use tracing::info;

use mom_care_data::models::format_timestamp;
use mom_care_data::repository::{AlertQuery, AlertScope, Repositories};

use super::ServiceError;
use crate::entities::conversions::{convert_all, convert_to_domain_alert};
use crate::entities::{Alert, User};

const PATIENT_ALERT_LIMIT: usize = 50;

/// A patient's own alerts
pub struct AlertService {
    repos: Repositories,
}

impl AlertService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Newest first
    pub async fn list(&self, user: &User) -> Result<Vec<Alert>, ServiceError> {
        let query = AlertQuery {
            patient_id: Some(user.id.clone()),
            limit: Some(PATIENT_ALERT_LIMIT),
            ..Default::default()
        };
        Ok(convert_all(self.repos.alerts.list(query).await?, convert_to_domain_alert)?)
    }

    pub async fn mark_read(&self, user: &User, alert_id: &str) -> Result<Alert, ServiceError> {
        let scope = AlertScope {
            patient_id: Some(user.id.clone()),
            provider_id: None,
        };
        let record = self
            .repos
            .alerts
            .mark_read(alert_id, scope, &format_timestamp(Utc::now()))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Alert not found".to_string()))?;
        info!("User {} marked alert {} read", user.id, alert_id);
        Ok(convert_to_domain_alert(record)?)
    }
}
