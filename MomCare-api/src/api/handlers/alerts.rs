use axum::extract::{Path, State};
use axum::{Extension, Json};
use tracing::instrument;

use mom_care_domain::auth::AuthUser;

use crate::api::state::AppState;
use crate::entities::patient::{AlertListResponse, AlertReadResponse};
use crate::entities::{ApiResult, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/alerts",
    responses((status = 200, description = "The caller's alerts, newest first", body = AlertListResponse)),
    security(("bearer" = [])),
    tag = "alerts"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn list_alerts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<AlertListResponse>> {
    let alerts = state.services.alerts.list(&user.0).await?;
    Ok(Json(AlertListResponse { alerts }))
}

#[utoipa::path(
    put,
    path = "/api/alerts/{id}/read",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert marked read", body = AlertReadResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn mark_alert_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<AlertReadResponse>> {
    let alert = state.services.alerts.mark_read(&user.0, &id).await?;
    Ok(Json(AlertReadResponse::new(alert)))
}
