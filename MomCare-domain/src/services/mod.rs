//! Domain services
//!
//! Each service owns the business rules for one area of the API and talks to
//! storage only through the repository traits.

use std::sync::Arc;

use thiserror::Error;
use tracing::error;
use validator::{Validate, ValidationErrors};

use mom_care_data::repository::{RepositoryError, Repositories};

use crate::assistant::TextGenerator;
use crate::auth::SecurityError;
use crate::config::AuthConfig;
use crate::entities::conversions::{convert_to_domain_pregnancy, convert_to_domain_user};
use crate::entities::{Pregnancy, User};
use crate::notify::{PushError, PushNotifier, RealtimeHub};

pub mod accounts;
pub mod alerts;
pub mod chat;
pub mod notifications;
pub mod pregnancy;
pub mod provider;
pub mod vitals;

pub use accounts::{
    AccountService, AuthSession, LoginRequest, ModeSwitch, Profile, RegisterRequest, UpdateProfileRequest, UserProfile,
};
pub use alerts::AlertService;
pub use chat::{ChatExchange, ChatService};
pub use notifications::{
    MulticastReceipt, NotificationService, PregnancyAlertRequest, SendMultipleRequest, SendReceipt, SendRequest,
    SendTopicRequest, TopicReceipt, TopicRequest,
};
pub use pregnancy::{
    ContractionOutcome, ContractionRequest, KickOutcome, KickRequest, PregnancyService, PregnancyStats, WeeklyStats,
};
pub use provider::{
    AlertWithPatient, ClinicScope, Dashboard, PatientDetail, PatientList, PatientSummary, ProviderAlerts, ProviderService,
    SimulatedAlert,
};
pub use vitals::{LatestVitals, LogVitalRequest, VitalOutcome, VitalsService};

/// Errors surfaced by the domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
            RepositoryError::Validation(msg) => ServiceError::Validation(msg),
            other => {
                error!("Repository failure: {}", other);
                ServiceError::Repository(other)
            }
        }
    }
}

impl From<PushError> for ServiceError {
    fn from(err: PushError) -> Self {
        match err {
            PushError::NotConfigured => ServiceError::Unavailable(err.to_string()),
            other => {
                error!("Push delivery failed: {}", other);
                ServiceError::Internal(other.to_string())
            }
        }
    }
}

/// Run `validator` checks and flatten the failures into one message
pub fn validate_request<T: Validate>(request: &T) -> Result<(), ServiceError> {
    request.validate().map_err(|errors| ServiceError::Validation(validation_message(&errors)))
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .map(|(field, errors)| {
            errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) async fn load_user(repos: &Repositories, user_id: &str) -> Result<User, ServiceError> {
    let record = repos
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
    Ok(convert_to_domain_user(record)?)
}

pub(crate) async fn active_pregnancy(
    repos: &Repositories,
    user_id: &str,
) -> Result<Option<Pregnancy>, ServiceError> {
    match repos.pregnancies.find_active(user_id).await? {
        Some(record) => Ok(Some(convert_to_domain_pregnancy(record)?)),
        None => Ok(None),
    }
}

/// Every domain service, shared through the router state
#[derive(Clone)]
pub struct Services {
    pub accounts: Arc<AccountService>,
    pub vitals: Arc<VitalsService>,
    pub pregnancy: Arc<PregnancyService>,
    pub alerts: Arc<AlertService>,
    pub chat: Arc<ChatService>,
    pub provider: Arc<ProviderService>,
    pub notifications: Arc<NotificationService>,
}

impl Services {
    pub fn new(
        repos: Repositories,
        auth: AuthConfig,
        hub: RealtimeHub,
        push: Arc<dyn PushNotifier>,
        generator: Option<Arc<dyn TextGenerator>>,
        simulation_enabled: bool,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(repos.clone(), auth)),
            vitals: Arc::new(VitalsService::new(repos.clone(), hub.clone(), push.clone())),
            pregnancy: Arc::new(PregnancyService::new(repos.clone())),
            alerts: Arc::new(AlertService::new(repos.clone())),
            chat: Arc::new(ChatService::new(repos.clone(), generator)),
            provider: Arc::new(ProviderService::new(repos, hub, simulation_enabled)),
            notifications: Arc::new(NotificationService::new(push)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
        password: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_validation_message_lists_each_field() {
        let sample = Sample { password: "abc".to_string(), email: "nope".to_string() };
        match validate_request(&sample) {
            Err(ServiceError::Validation(msg)) => {
                assert_eq!(msg, "Invalid email; Password must be at least 6 characters");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_repository_errors_map_to_service_errors() {
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("Email already registered".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound("x".into())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Task("boom".into())),
            ServiceError::Repository(_)
        ));
    }
}
