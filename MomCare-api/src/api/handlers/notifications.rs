use axum::extract::State;
use axum::Json;
use tracing::instrument;

use mom_care_domain::services::{
    MulticastReceipt, PregnancyAlertRequest, SendMultipleRequest, SendReceipt, SendRequest, SendTopicRequest,
    TopicReceipt, TopicRequest,
};

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::entities::{ApiResult, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/notifications/send",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Delivered to the device", body = SendReceipt),
        (status = 400, description = "Missing token, title or body", body = ErrorResponse),
        (status = 503, description = "Push notifications not configured", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state, request))]
pub async fn send(State(state): State<AppState>, ApiJson(request): ApiJson<SendRequest>) -> ApiResult<Json<SendReceipt>> {
    Ok(Json(state.services.notifications.send(request).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/send-multiple",
    request_body = SendMultipleRequest,
    responses(
        (status = 200, description = "Per-device delivery counts", body = MulticastReceipt),
        (status = 400, description = "Missing tokens, title or body", body = ErrorResponse),
        (status = 503, description = "Push notifications not configured", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state, request))]
pub async fn send_multiple(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendMultipleRequest>,
) -> ApiResult<Json<MulticastReceipt>> {
    Ok(Json(state.services.notifications.send_multiple(request).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/send-topic",
    request_body = SendTopicRequest,
    responses(
        (status = 200, description = "Delivered to the topic", body = SendReceipt),
        (status = 400, description = "Missing topic, title or body", body = ErrorResponse),
        (status = 503, description = "Push notifications not configured", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state, request))]
pub async fn send_topic(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendTopicRequest>,
) -> ApiResult<Json<SendReceipt>> {
    Ok(Json(state.services.notifications.send_topic(request).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/subscribe",
    request_body = TopicRequest,
    responses(
        (status = 200, description = "Device subscribed", body = TopicReceipt),
        (status = 400, description = "Missing token or topic", body = ErrorResponse),
        (status = 503, description = "Push notifications not configured", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state, request))]
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TopicRequest>,
) -> ApiResult<Json<TopicReceipt>> {
    Ok(Json(state.services.notifications.subscribe(request).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/unsubscribe",
    request_body = TopicRequest,
    responses(
        (status = 200, description = "Device unsubscribed", body = TopicReceipt),
        (status = 400, description = "Missing token or topic", body = ErrorResponse),
        (status = 503, description = "Push notifications not configured", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state, request))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TopicRequest>,
) -> ApiResult<Json<TopicReceipt>> {
    Ok(Json(state.services.notifications.unsubscribe(request).await?))
}

/// Broadcast a health alert to every pregnancy-mode device
#[utoipa::path(
    post,
    path = "/api/notifications/alert-pregnancy",
    request_body = PregnancyAlertRequest,
    responses(
        (status = 200, description = "Alert sent to the pregnancy topic", body = SendReceipt),
        (status = 400, description = "Body is required", body = ErrorResponse),
        (status = 503, description = "Push notifications not configured", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(state, request))]
pub async fn alert_pregnancy(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PregnancyAlertRequest>,
) -> ApiResult<Json<SendReceipt>> {
    Ok(Json(state.services.notifications.alert_pregnancy(request).await?))
}
