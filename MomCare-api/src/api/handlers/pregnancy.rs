use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::instrument;

use mom_care_domain::auth::AuthUser;
use mom_care_domain::services::{ContractionRequest, KickRequest, PregnancyStats};

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::entities::patient::{
    ContractionLoggedResponse, KickLoggedResponse, PregnancyResponse, PregnancyStartedResponse, StartPregnancyRequest,
};
use crate::entities::{ApiResult, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/pregnancy",
    responses(
        (status = 200, description = "Active pregnancy", body = PregnancyResponse),
        (status = 404, description = "No active pregnancy", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "pregnancy"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn current_pregnancy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<PregnancyResponse>> {
    let pregnancy = state.services.pregnancy.current(&user.0).await?;
    Ok(Json(PregnancyResponse { pregnancy }))
}

/// Start tracking a pregnancy from the last menstrual period
#[utoipa::path(
    post,
    path = "/api/pregnancy",
    request_body = StartPregnancyRequest,
    responses(
        (status = 201, description = "Pregnancy started", body = PregnancyStartedResponse),
        (status = 400, description = "Missing or invalid date", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "pregnancy"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn start_pregnancy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<StartPregnancyRequest>,
) -> ApiResult<impl IntoResponse> {
    let pregnancy = state
        .services
        .pregnancy
        .start(user.0, request.last_menstrual_period.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PregnancyStartedResponse {
            message: "Pregnancy started".to_string(),
            pregnancy,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/pregnancy/kicks",
    request_body = KickRequest,
    responses(
        (status = 200, description = "Kick session logged", body = KickLoggedResponse),
        (status = 404, description = "No active pregnancy", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "pregnancy"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn log_kicks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<KickRequest>,
) -> ApiResult<Json<KickLoggedResponse>> {
    let outcome = state.services.pregnancy.log_kicks(&user.0, request).await?;
    Ok(Json(KickLoggedResponse {
        message: "Kick count logged".to_string(),
        outcome,
    }))
}

#[utoipa::path(
    post,
    path = "/api/pregnancy/contractions",
    request_body = ContractionRequest,
    responses(
        (status = 200, description = "Contraction logged", body = ContractionLoggedResponse),
        (status = 400, description = "Invalid duration or intensity", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "pregnancy"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn log_contraction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ContractionRequest>,
) -> ApiResult<Json<ContractionLoggedResponse>> {
    let outcome = state.services.pregnancy.log_contraction(&user.0, request).await?;
    Ok(Json(ContractionLoggedResponse {
        message: "Contraction logged".to_string(),
        outcome,
    }))
}

#[utoipa::path(
    get,
    path = "/api/pregnancy/stats",
    responses(
        (status = 200, description = "Pregnancy progress and weekly counts", body = PregnancyStats),
        (status = 404, description = "No active pregnancy", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "pregnancy"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn pregnancy_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<PregnancyStats>> {
    Ok(Json(state.services.pregnancy.stats(&user.0).await?))
}
