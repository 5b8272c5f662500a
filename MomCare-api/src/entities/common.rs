use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use mom_care_domain::services::ServiceError;

/// Error response format for API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn validation_error(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("forbidden", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
    }

    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::validation_error(msg, None),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Conflict(msg) => Self::bad_request(msg),
            ServiceError::Unauthorized(msg) => Self::unauthorized(msg),
            ServiceError::Forbidden(msg) => Self::forbidden(msg),
            ServiceError::Unavailable(msg) => Self::service_unavailable(msg),
            other => {
                error!("Request failed: {}", other);
                Self::internal_error()
            }
        }
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ErrorResponse>;

/// `{message}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error"),
            (ServiceError::Conflict("Email already registered".into()), StatusCode::BAD_REQUEST, "bad_request"),
            (ServiceError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED, "unauthorized"),
            (ServiceError::Forbidden("no".into()), StatusCode::FORBIDDEN, "forbidden"),
            (ServiceError::NotFound("gone".into()), StatusCode::NOT_FOUND, "not_found"),
            (ServiceError::Unavailable("off".into()), StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
            (ServiceError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];
        for (err, status, code) in cases {
            let response = ErrorResponse::from(err);
            assert_eq!(response.status(), status);
            assert_eq!(response.error, code);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = ErrorResponse::from(ServiceError::Internal("database password leaked".into()));
        assert_eq!(response.message, "An unexpected error occurred");
    }
}
