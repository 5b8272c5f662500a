use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::{info, instrument};

use mom_care_domain::auth::AuthUser;
use mom_care_domain::services::{LoginRequest, Profile, RegisterRequest, UpdateProfileRequest};

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::entities::auth::{FcmTokenRequest, ModeRequest, ModeResponse, ProfileUpdatedResponse, SessionResponse};
use crate::entities::{ApiResult, ErrorResponse, MessageResponse};

/// Create an account and return a token
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid input or email already registered", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.services.accounts.register(request).await?;
    info!("Registered user {}", session.user.id);
    Ok((StatusCode::CREATED, Json(SessionResponse::registered(session))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.services.accounts.login(request).await?;
    Ok(Json(SessionResponse::logged_in(session)))
}

/// The caller's profile and active pregnancy
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current profile", body = Profile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Json<Profile>> {
    Ok(Json(state.services.accounts.profile(user.0).await?))
}

#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "Invalid field", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileUpdatedResponse>> {
    let user = state.services.accounts.update_profile(user.0, request).await?;
    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated".to_string(),
        user,
    }))
}

/// Switch between fertility and pregnancy tracking
#[utoipa::path(
    post,
    path = "/api/auth/mode",
    request_body = ModeRequest,
    responses(
        (status = 200, description = "Mode switched", body = ModeResponse),
        (status = 400, description = "Invalid mode or date", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn switch_mode(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ModeRequest>,
) -> ApiResult<Json<ModeResponse>> {
    let mode = request.mode.unwrap_or_default();
    let switch = state
        .services
        .accounts
        .switch_mode(user.0, &mode, request.last_menstrual_period.as_deref())
        .await?;

    Ok(Json(ModeResponse {
        message: format!("Switched to {} mode", switch.mode),
        mode: switch.mode,
        pregnancy: switch.pregnancy,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/update-fcm",
    request_body = FcmTokenRequest,
    responses(
        (status = 200, description = "Push token stored", body = MessageResponse),
        (status = 400, description = "Token missing", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn update_fcm_token(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<FcmTokenRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.services.accounts.update_push_token(user.0, request.fcm_token).await?;
    Ok(Json(MessageResponse::new("FCM token updated successfully")))
}

/// Revoke every token issued to the caller so far
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse)),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn logout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Json<MessageResponse> {
    state.services.accounts.logout(&user.0);
    Json(MessageResponse::new("Logged out successfully"))
}
