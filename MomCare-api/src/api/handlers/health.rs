use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, instrument, warn};

use mom_care_domain::health::SystemHealth;

use crate::api::state::AppState;

/// Health check endpoint to verify the API is running
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "API is healthy", body = SystemHealth),
        (status = 503, description = "API is degraded or a component is down", body = SystemHealth)
    ),
    tag = "health"
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health.get_system_health().await;

    if health.is_healthy() {
        info!("Health check passed");
        (StatusCode::OK, Json(health))
    } else {
        warn!("Health check reports {:?}", health.status);
        (StatusCode::SERVICE_UNAVAILABLE, Json(health))
    }
}
