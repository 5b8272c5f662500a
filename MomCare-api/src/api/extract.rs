//! Request extractors with API-shaped rejections

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::entities::ErrorResponse;

/// `Json` whose rejections become `400 validation_error` bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(rejection_response(rejection))
            }
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> ErrorResponse {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::JsonDataError(_) => "Request body has missing or invalid fields",
        _ => "Invalid request body",
    };
    ErrorResponse::validation_error(message, Some(json!({ "reason": rejection.body_text() })))
}
