use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::{info, instrument};

use mom_care_domain::auth::AuthUser;
use mom_care_domain::services::LogVitalRequest;

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::entities::patient::{LatestVitalsResponse, VitalHistoryQuery, VitalListResponse, VitalLoggedResponse};
use crate::entities::{ApiResult, ErrorResponse};

/// Log a vital; BP and blood sugar readings may raise alerts
#[utoipa::path(
    post,
    path = "/api/vitals",
    request_body = LogVitalRequest,
    responses(
        (status = 201, description = "Vital logged", body = VitalLoggedResponse),
        (status = 400, description = "Invalid reading", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn log_vital(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<LogVitalRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.services.vitals.log(&user.0, request).await?;
    if let Some(alert) = &outcome.alert {
        info!("Vital {} raised {} alert {}", outcome.vital.id, alert.alert_type, alert.id);
    }
    Ok((StatusCode::CREATED, Json(VitalLoggedResponse::from(outcome))))
}

#[utoipa::path(
    get,
    path = "/api/vitals",
    params(VitalHistoryQuery),
    responses(
        (status = 200, description = "Vitals, newest first", body = VitalListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn list_vitals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<VitalHistoryQuery>,
) -> ApiResult<Json<VitalListResponse>> {
    let vitals = state
        .services
        .vitals
        .history(&user.0, query.vital_type.as_deref(), query.days)
        .await?;
    Ok(Json(VitalListResponse { vitals }))
}

#[utoipa::path(
    get,
    path = "/api/vitals/latest",
    responses((status = 200, description = "Newest reading per type", body = LatestVitalsResponse)),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn latest_vitals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<LatestVitalsResponse>> {
    let latest = state.services.vitals.latest(&user.0).await?;
    Ok(Json(LatestVitalsResponse { latest }))
}
