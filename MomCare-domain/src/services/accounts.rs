use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use mom_care_data::repository::Repositories;

use super::pregnancy::{parse_lmp, start_pregnancy};
use super::{active_pregnancy, validate_request, ServiceError};
use crate::auth::logging::{log_failed_login, log_logout, log_registration, log_successful_login};
use crate::auth::{password, token};
use crate::config::AuthConfig;
use crate::entities::conversions::{convert_to_data_user, convert_to_domain_user};
use crate::entities::{BloodType, Mode, PregnancyDetails, Role, User};

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// `patient` (default) or `provider`
    pub role: Option<String>,
    /// `fertility` (default) or `pregnancy`
    pub current_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile fields a user may change. Anything else in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 120, message = "Age must be between 0 and 120"))]
    pub age: Option<i64>,
    /// Centimetres
    #[validate(range(min = 1.0, max = 300.0, message = "Height must be between 1 and 300 cm"))]
    pub height: Option<f64>,
    /// Kilograms
    #[validate(range(min = 1.0, max = 500.0, message = "Weight must be between 1 and 500 kg"))]
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub current_mode: Option<String>,
    #[validate(range(min = 15, max = 60, message = "Average cycle length must be between 15 and 60 days"))]
    pub average_cycle_length: Option<i64>,
    #[validate(range(min = 1, max = 15, message = "Average period length must be between 1 and 15 days"))]
    pub average_period_length: Option<i64>,
    pub last_menstrual_period: Option<String>,
    pub medical_conditions: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub notifications_enabled: Option<bool>,
    pub fcm_token: Option<String>,
}

/// A freshly issued token and the account it belongs to
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// A user as returned to its owner, with derived BMI
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub bmi: Option<f64>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let bmi = user.bmi();
        Self { user, bmi }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Profile {
    pub user: UserProfile,
    pub pregnancy: Option<PregnancyDetails>,
}

/// Outcome of a mode switch
#[derive(Debug, Clone)]
pub struct ModeSwitch {
    pub mode: Mode,
    pub pregnancy: Option<PregnancyDetails>,
}

/// Registration, login and profile management
pub struct AccountService {
    repos: Repositories,
    auth: AuthConfig,
}

impl AccountService {
    pub fn new(repos: Repositories, auth: AuthConfig) -> Self {
        Self { repos, auth }
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ServiceError> {
        validate_request(&request)?;
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Name is required".to_string()));
        }

        let role = match request.role.as_deref() {
            Some(role) => role.parse::<Role>().map_err(ServiceError::Validation)?,
            None => Role::Patient,
        };
        let mode = match request.current_mode.as_deref() {
            Some(mode) => mode.parse::<Mode>().map_err(|_| ServiceError::Validation("Invalid mode".to_string()))?,
            None => Mode::Fertility,
        };

        let email = request.email.trim().to_lowercase();
        if self.repos.users.find_by_email(&email).await?.is_some() {
            log_failed_login(&email, "registration with existing email");
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))??;

        let user = User::new(&email, password_hash, name, role, mode);
        self.repos.users.create(convert_to_data_user(&user)).await?;

        log_registration(&user.id, role.as_str());
        info!("Registered {} account {}", role, user.id);

        let token = token::generate_token(&self.auth, &user.id, user.role)?;
        Ok(AuthSession { token, user })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, ServiceError> {
        validate_request(&request)?;
        let email = request.email.trim().to_lowercase();

        let user = match self.repos.users.find_by_email(&email).await? {
            Some(record) => convert_to_domain_user(record)?,
            None => {
                log_failed_login(&email, "unknown email");
                return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        let password = request.password;
        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))??;

        if !matches {
            log_failed_login(&email, "wrong password");
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }

        log_successful_login(&user.id);
        let token = token::generate_token(&self.auth, &user.id, user.role)?;
        Ok(AuthSession { token, user })
    }

    /// Resolve a bearer token to its account
    pub async fn authenticate(&self, bearer: &str) -> Result<User, ServiceError> {
        let claims = token::validate_token(&self.auth, bearer).map_err(|e| {
            debug!("Token rejected: {}", e);
            ServiceError::Unauthorized("Invalid token".to_string())
        })?;

        match self.repos.users.find_by_id(&claims.sub).await? {
            Some(record) => Ok(convert_to_domain_user(record)?),
            None => {
                warn!("Valid token for unknown user {}", claims.sub);
                Err(ServiceError::Unauthorized("User not found".to_string()))
            }
        }
    }

    pub async fn profile(&self, user: User) -> Result<Profile, ServiceError> {
        let pregnancy = match user.current_mode {
            Mode::Pregnancy => active_pregnancy(&self.repos, &user.id)
                .await?
                .map(|p| p.details(Utc::now())),
            Mode::Fertility => None,
        };
        Ok(Profile { user: user.into(), pregnancy })
    }

    pub async fn update_profile(
        &self,
        mut user: User,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, ServiceError> {
        validate_request(&request)?;

        if let Some(name) = request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ServiceError::Validation("Name cannot be empty".to_string()));
            }
            user.name = name.to_string();
        }
        if let Some(age) = request.age {
            user.age = Some(age);
        }
        if let Some(height) = request.height {
            user.height = Some(height);
        }
        if let Some(weight) = request.weight {
            user.weight = Some(weight);
        }
        if let Some(blood_type) = request.blood_type {
            user.blood_type = Some(blood_type.parse::<BloodType>().map_err(ServiceError::Validation)?);
        }
        if let Some(mode) = request.current_mode {
            user.current_mode = mode
                .parse::<Mode>()
                .map_err(|_| ServiceError::Validation("Invalid mode".to_string()))?;
        }
        if let Some(length) = request.average_cycle_length {
            user.average_cycle_length = length;
        }
        if let Some(length) = request.average_period_length {
            user.average_period_length = length;
        }
        if let Some(lmp) = request.last_menstrual_period {
            user.last_menstrual_period = Some(parse_lmp(Some(&lmp))?);
        }
        if let Some(conditions) = request.medical_conditions {
            user.medical_conditions = conditions;
        }
        if let Some(allergies) = request.allergies {
            user.allergies = allergies;
        }
        if let Some(medications) = request.medications {
            user.medications = medications;
        }
        if let Some(enabled) = request.notifications_enabled {
            user.notifications_enabled = enabled;
        }
        if let Some(token) = request.fcm_token {
            user.fcm_token = Some(token);
        }

        self.repos.users.update(convert_to_data_user(&user)).await?;
        info!("Updated profile for user {}", user.id);
        Ok(user.into())
    }

    pub async fn switch_mode(
        &self,
        mut user: User,
        mode: &str,
        last_menstrual_period: Option<&str>,
    ) -> Result<ModeSwitch, ServiceError> {
        let mode = mode
            .parse::<Mode>()
            .map_err(|_| ServiceError::Validation("Invalid mode".to_string()))?;

        if mode == Mode::Pregnancy {
            if let Some(lmp) = last_menstrual_period {
                let lmp = parse_lmp(Some(lmp))?;
                let now = Utc::now();
                let pregnancy = start_pregnancy(&self.repos, &mut user, lmp, now).await?;
                info!("User {} switched to pregnancy mode with a new pregnancy", user.id);
                return Ok(ModeSwitch { mode, pregnancy: Some(pregnancy.details(now)) });
            }
        }

        user.current_mode = mode;
        self.repos.users.update(convert_to_data_user(&user)).await?;
        info!("User {} switched to {} mode", user.id, mode);
        Ok(ModeSwitch { mode, pregnancy: None })
    }

    pub async fn update_push_token(&self, mut user: User, fcm_token: Option<String>) -> Result<(), ServiceError> {
        let fcm_token = fcm_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::Validation("FCM token is required".to_string()))?;

        user.fcm_token = Some(fcm_token);
        self.repos.users.update(convert_to_data_user(&user)).await?;
        debug!("Stored push token for user {}", user.id);
        Ok(())
    }

    /// Revoke every token the user holds
    pub fn logout(&self, user: &User) {
        token::revoke_tokens(&self.auth, &user.id);
        log_logout(&user.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::test_support::repositories;

    fn service() -> AccountService {
        AccountService::new(repositories(), AppConfig::for_testing().auth)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: "Meera".to_string(),
            role: None,
            current_mode: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let session = service.register(register_request("Meera@Example.com ")).await.unwrap();
        assert_eq!(session.user.email, "meera@example.com");
        assert_eq!(session.user.role, Role::Patient);
        assert_eq!(session.user.current_mode, Mode::Fertility);

        let login = service
            .login(LoginRequest { email: "meera@example.com".into(), password: "secret123".into() })
            .await
            .unwrap();
        assert_eq!(login.user.id, session.user.id);

        let user = service.authenticate(&login.token).await.unwrap();
        assert_eq!(user.id, session.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_short_passwords() {
        let service = service();
        service.register(register_request("dup@example.com")).await.unwrap();

        match service.register(register_request("dup@example.com")).await {
            Err(ServiceError::Conflict(msg)) => assert_eq!(msg, "Email already registered"),
            other => panic!("expected conflict, got {:?}", other.map(|s| s.user.id)),
        }

        let mut short = register_request("short@example.com");
        short.password = "abc".to_string();
        assert!(matches!(service.register(short).await, Err(ServiceError::Validation(_))));

        let mut bad_role = register_request("role@example.com");
        bad_role.role = Some("admin".to_string());
        assert!(matches!(service.register(bad_role).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let service = service();
        service.register(register_request("wrong@example.com")).await.unwrap();

        let result = service
            .login(LoginRequest { email: "wrong@example.com".into(), password: "nope123".into() })
            .await;
        match result {
            Err(ServiceError::Unauthorized(msg)) => assert_eq!(msg, "Invalid credentials"),
            other => panic!("expected unauthorized, got {:?}", other.map(|s| s.user.id)),
        }
    }

    #[tokio::test]
    async fn test_logout_revokes_existing_tokens() {
        let service = service();
        let session = service.register(register_request("logout@example.com")).await.unwrap();

        service.logout(&session.user);
        match service.authenticate(&session.token).await {
            Err(ServiceError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("expected unauthorized, got {:?}", other.map(|u| u.id)),
        }

        let again = service
            .login(LoginRequest { email: "logout@example.com".into(), password: "secret123".into() })
            .await
            .unwrap();
        assert!(service.authenticate(&again.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_applies_known_fields() {
        let service = service();
        let session = service.register(register_request("profile@example.com")).await.unwrap();

        let update = UpdateProfileRequest {
            height: Some(160.0),
            weight: Some(64.0),
            blood_type: Some("B+".into()),
            allergies: Some(vec!["latex".into()]),
            ..Default::default()
        };
        let profile = service.update_profile(session.user, update).await.unwrap();
        assert_eq!(profile.bmi, Some(25.0));
        assert_eq!(profile.user.blood_type, Some(BloodType::BPositive));
        assert_eq!(profile.user.allergies, vec!["latex".to_string()]);

        let bad = UpdateProfileRequest { blood_type: Some("Z".into()), ..Default::default() };
        assert!(matches!(
            service.update_profile(profile.user, bad).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_switch_mode_to_pregnancy_starts_pregnancy() {
        let service = service();
        let session = service.register(register_request("mode@example.com")).await.unwrap();
        let lmp = (Utc::now() - chrono::Duration::weeks(10)).format("%Y-%m-%d").to_string();

        let switched = service.switch_mode(session.user.clone(), "pregnancy", Some(&lmp)).await.unwrap();
        assert_eq!(switched.mode, Mode::Pregnancy);
        assert!(switched.pregnancy.is_some());

        let user = service.authenticate(&session.token).await.unwrap();
        let profile = service.profile(user).await.unwrap();
        assert_eq!(profile.pregnancy.map(|p| p.current_week), Some(10));

        assert!(matches!(
            service.switch_mode(session.user, "sleeping", None).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_push_token_requires_value() {
        let service = service();
        let session = service.register(register_request("fcm@example.com")).await.unwrap();
        assert!(matches!(
            service.update_push_token(session.user.clone(), Some("  ".into())).await,
            Err(ServiceError::Validation(_))
        ));
        service.update_push_token(session.user, Some("device-token".into())).await.unwrap();
    }
}
