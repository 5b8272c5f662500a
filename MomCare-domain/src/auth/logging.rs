use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Types of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    Login,
    FailedLogin,
    Registration,
    TokenValidation,
    AccessDenied,
    Logout,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
            AuthEventType::AccessDenied => write!(f, "ACCESS_DENIED"),
            AuthEventType::Logout => write!(f, "LOGOUT"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    /// User id or attempted email, if known
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub details: Option<String>,
    /// Request path for access decisions
    pub resource: Option<String>,
    pub duration_ms: Option<u64>,
    /// password, jwt or role
    pub auth_method: Option<String>,
}

impl AuthEvent {
    pub fn new(event_type: AuthEventType, user_id: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user_id: user_id.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }

    /// The single log line written for this event
    pub fn log_line(&self) -> String {
        let user = self.user_id.as_deref().unwrap_or("anonymous");
        let status = if self.success { "SUCCESS" } else { "FAILURE" };
        let mut details = self.details.clone().unwrap_or_default();
        if let Some(resource) = &self.resource {
            if !details.is_empty() {
                details.push(' ');
            }
            details.push_str(&format!("resource={}", resource));
        }
        if let Some(ms) = self.duration_ms {
            if !details.is_empty() {
                details.push(' ');
            }
            details.push_str(&format!("duration_ms={}", ms));
        }

        format!(
            "AUTH-LOG [{}] [{}] [{}] [{}] {}",
            self.event_type,
            user,
            status,
            self.timestamp.to_rfc3339(),
            details
        )
    }
}

/// Log an authentication event
pub fn log_auth_event(event: AuthEvent) {
    info!(
        auth_method = event.auth_method.as_deref().unwrap_or("-"),
        "{}",
        event.log_line()
    );
}

pub fn log_successful_login(user_id: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::Login, Some(user_id), true).with_auth_method("password"),
    );
}

/// `attempted` is the email that was tried, since there may be no user
pub fn log_failed_login(attempted: &str, reason: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::FailedLogin, Some(attempted), false)
            .with_details(reason)
            .with_auth_method("password"),
    );
}

pub fn log_registration(user_id: &str, role: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::Registration, Some(user_id), true)
            .with_details(format!("role={}", role))
            .with_auth_method("password"),
    );
}

pub fn log_token_validation(user_id: Option<&str>, success: bool, details: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::TokenValidation, user_id, success)
            .with_details(details)
            .with_auth_method("jwt"),
    );
}

pub fn log_logout(user_id: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::Logout, Some(user_id), true)
            .with_details("Tokens revoked"),
    );
}

pub fn log_access_denied(user_id: &str, resource: &str, required_roles: &[String]) {
    let details = format!("Required roles: {}", required_roles.join(", "));

    log_auth_event(
        AuthEvent::new(AuthEventType::AccessDenied, Some(user_id), false)
            .with_resource(resource)
            .with_details(details)
            .with_auth_method("role"),
    );
}
