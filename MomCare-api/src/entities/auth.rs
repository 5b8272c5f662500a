use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use mom_care_domain::entities::{Mode, PregnancyDetails, Role, User};
use mom_care_domain::services::{AuthSession, UserProfile};

/// Account summary returned with a fresh token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_mode: Option<Mode>,
}

impl SessionUser {
    fn from_user(user: User, with_mode: bool) -> Self {
        Self {
            current_mode: with_mode.then_some(user.current_mode),
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

/// Registration and login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub message: String,
    /// JWT bearer token
    pub token: String,
    pub user: SessionUser,
}

impl SessionResponse {
    pub fn registered(session: AuthSession) -> Self {
        Self {
            message: "User registered successfully".to_string(),
            token: session.token,
            user: SessionUser::from_user(session.user, false),
        }
    }

    pub fn logged_in(session: AuthSession) -> Self {
        Self {
            message: "Login successful".to_string(),
            token: session.token,
            user: SessionUser::from_user(session.user, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModeRequest {
    /// `fertility` or `pregnancy`
    pub mode: Option<String>,
    /// Starts a new pregnancy when switching to pregnancy mode
    pub last_menstrual_period: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModeResponse {
    pub message: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pregnancy: Option<PregnancyDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FcmTokenRequest {
    pub fcm_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            token: "jwt".to_string(),
            user: User::new("Asha@Example.com", "hash".to_string(), "Asha", Role::Patient, Mode::Pregnancy),
        }
    }

    #[test]
    fn test_register_response_omits_mode() {
        let json = serde_json::to_value(SessionResponse::registered(session())).unwrap();
        assert_eq!(json["message"], "User registered successfully");
        assert_eq!(json["user"]["email"], "asha@example.com");
        assert_eq!(json["user"]["role"], "patient");
        assert!(json["user"].get("currentMode").is_none());
    }

    #[test]
    fn test_login_response_includes_mode() {
        let json = serde_json::to_value(SessionResponse::logged_in(session())).unwrap();
        assert_eq!(json["token"], "jwt");
        assert_eq!(json["user"]["currentMode"], "pregnancy");
    }
}
