use axum::extract::State;
use axum::{Extension, Json};
use tracing::{debug, instrument};

use mom_care_domain::auth::AuthUser;

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::entities::patient::{ChatRequest, ChatResponse, MessageListResponse};
use crate::entities::{ApiResult, ErrorResponse};

/// Ask the health assistant a question
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Stored question and reply", body = ChatResponse),
        (status = 400, description = "Message required", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn send_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = request.message.unwrap_or_default();
    let exchange = state.services.chat.send(&user.0, &message).await?;
    debug!("Assistant replied with message {}", exchange.ai_message.id);
    Ok(Json(exchange.into()))
}

#[utoipa::path(
    get,
    path = "/api/chat/history",
    responses((status = 200, description = "Assistant thread, oldest first", body = MessageListResponse)),
    security(("bearer" = [])),
    tag = "chat"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MessageListResponse>> {
    let messages = state.services.chat.history(&user.0).await?;
    Ok(Json(MessageListResponse { messages }))
}
