//! Authentication for the MomCare API
//!
//! Bearer JWTs are validated by [`auth_middleware`], which loads the account
//! and stores it in the request extensions as [`AuthUser`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::entities::User;
use crate::services::{AccountService, ServiceError};
use logging::{log_auth_event, AuthEvent, AuthEventType};

pub mod authorize;
pub mod logging;
pub mod password;
pub mod token;
pub mod token_blacklist;

pub use authorize::{require_provider, require_role};
pub use token::SecurityError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// `patient` or `provider`
    pub role: String,
    /// Issuer
    pub iss: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// The authenticated account, inserted by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message,
        })),
    )
        .into_response()
}

/// Pull the token out of an `Authorization: Bearer` header
pub fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware for protected routes
pub async fn auth_middleware(
    State(accounts): State<Arc<AccountService>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let request_path = req.uri().path().to_string();
    let start_time = std::time::Instant::now();

    let token = match bearer_token(&req) {
        Some(token) => token.to_string(),
        None => {
            debug!("Missing or malformed Authorization header");
            let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                .with_details("Missing Bearer token")
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);
            return unauthorized("No auth token provided");
        }
    };

    match accounts.authenticate(&token).await {
        Ok(user) => {
            let event = AuthEvent::new(AuthEventType::TokenValidation, Some(&user.id), true)
                .with_details("JWT validation successful")
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);

            req.extensions_mut().insert(AuthUser(user));
            next.run(req).await
        }
        Err(ServiceError::Unauthorized(message)) => {
            warn!("Rejected request to {}: {}", request_path, message);
            let event = AuthEvent::new(AuthEventType::TokenValidation, None, false)
                .with_details(message.clone())
                .with_resource(request_path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt");
            log_auth_event(event);
            unauthorized(&message)
        }
        Err(e) => {
            error!("Authentication lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An internal server error occurred",
                })),
            )
                .into_response()
        }
    }
}

/// CORS and security response headers
#[cfg(feature = "with-api")]
pub fn configure_security(app: axum::Router, cors_origins: &[String]) -> axum::Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    };

    app.layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=(), interest-cohort=()"),
        ))
}
