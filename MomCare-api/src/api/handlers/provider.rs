//! Provider panel and clinic-wide views
//!
//! The `/api/provider` handlers are scoped to the caller's own patients; the
//! `/api/provider/clinic` variants see every patient in the clinic.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::{info, instrument};

use mom_care_domain::auth::AuthUser;
use mom_care_domain::services::{validate_request, ClinicScope, Dashboard, PatientDetail, PatientList, ProviderAlerts};

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::entities::patient::{AlertReadResponse, MessageListResponse};
use crate::entities::provider::{
    MessageSentResponse, PatientListQuery, ProviderAlertQuery, SendMessageRequest, SimulationResponse,
};
use crate::entities::{ApiResult, ErrorResponse};

async fn list_patients(state: &AppState, scope: ClinicScope, query: PatientListQuery) -> ApiResult<Json<PatientList>> {
    let list = state
        .services
        .provider
        .patients(&scope, query.risk.as_deref(), query.search.as_deref())
        .await?;
    Ok(Json(list))
}

async fn list_alerts(state: &AppState, scope: ClinicScope, query: ProviderAlertQuery) -> ApiResult<Json<ProviderAlerts>> {
    let alerts = state
        .services
        .provider
        .alerts(&scope, query.alert_type.as_deref(), query.unread_only)
        .await?;
    Ok(Json(alerts))
}

#[utoipa::path(
    get,
    path = "/api/provider/patients",
    params(PatientListQuery),
    responses(
        (status = 200, description = "Assigned patients, highest risk first", body = PatientList),
        (status = 403, description = "Provider access required", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn patients(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PatientListQuery>,
) -> ApiResult<Json<PatientList>> {
    list_patients(&state, ClinicScope::for_provider(&user.0), query).await
}

#[utoipa::path(
    get,
    path = "/api/provider/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient detail with charts", body = PatientDetail),
        (status = 404, description = "Patient not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn patient_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientDetail>> {
    let scope = ClinicScope::for_provider(&user.0);
    Ok(Json(state.services.provider.patient_detail(&scope, &id).await?))
}

#[utoipa::path(
    get,
    path = "/api/provider/alerts",
    params(ProviderAlertQuery),
    responses(
        (status = 200, description = "Alerts addressed to the caller", body = ProviderAlerts),
        (status = 400, description = "Invalid alert type", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn alerts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ProviderAlertQuery>,
) -> ApiResult<Json<ProviderAlerts>> {
    list_alerts(&state, ClinicScope::for_provider(&user.0), query).await
}

#[utoipa::path(
    put,
    path = "/api/provider/alerts/{id}/read",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert marked read", body = AlertReadResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn mark_alert_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<AlertReadResponse>> {
    let scope = ClinicScope::for_provider(&user.0);
    let alert = state.services.provider.mark_alert_read(&scope, &id).await?;
    Ok(Json(AlertReadResponse::new(alert)))
}

#[utoipa::path(
    get,
    path = "/api/provider/messages/{patientId}",
    params(("patientId" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Conversation, oldest first", body = MessageListResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn conversation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<MessageListResponse>> {
    let messages = state.services.provider.conversation(&user.0, &patient_id).await?;
    Ok(Json(MessageListResponse { messages }))
}

/// Message an assigned patient; the patient is notified over the realtime channel
#[utoipa::path(
    post,
    path = "/api/provider/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageSentResponse),
        (status = 400, description = "Missing patient or content", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user, request), fields(user_id = %user.id()))]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_request(&request)?;

    let message = state
        .services
        .provider
        .send_message(&user.0, &request.patient_id, &request.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageSentResponse {
            message: "Message sent".to_string(),
            data: message,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/provider/dashboard",
    responses((status = 200, description = "Panel stats and recent alerts", body = Dashboard)),
    security(("bearer" = [])),
    tag = "provider"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Dashboard>> {
    let scope = ClinicScope::for_provider(&user.0);
    Ok(Json(state.services.provider.dashboard(&scope).await?))
}

#[utoipa::path(
    get,
    path = "/api/provider/clinic/dashboard",
    responses((status = 200, description = "Clinic-wide stats and recent alerts", body = Dashboard)),
    security(("bearer" = [])),
    tag = "clinic"
)]
#[instrument(skip(state))]
pub async fn clinic_dashboard(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.services.provider.dashboard(&ClinicScope::Clinic).await?))
}

#[utoipa::path(
    get,
    path = "/api/provider/clinic/patients",
    params(PatientListQuery),
    responses((status = 200, description = "Every patient, highest risk first", body = PatientList)),
    security(("bearer" = [])),
    tag = "clinic"
)]
#[instrument(skip(state))]
pub async fn clinic_patients(
    State(state): State<AppState>,
    Query(query): Query<PatientListQuery>,
) -> ApiResult<Json<PatientList>> {
    list_patients(&state, ClinicScope::Clinic, query).await
}

#[utoipa::path(
    get,
    path = "/api/provider/clinic/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient detail with charts", body = PatientDetail),
        (status = 404, description = "Patient not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "clinic"
)]
#[instrument(skip(state))]
pub async fn clinic_patient_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientDetail>> {
    Ok(Json(state.services.provider.patient_detail(&ClinicScope::Clinic, &id).await?))
}

#[utoipa::path(
    get,
    path = "/api/provider/clinic/alerts",
    params(ProviderAlertQuery),
    responses((status = 200, description = "Every clinic alert", body = ProviderAlerts)),
    security(("bearer" = [])),
    tag = "clinic"
)]
#[instrument(skip(state))]
pub async fn clinic_alerts(
    State(state): State<AppState>,
    Query(query): Query<ProviderAlertQuery>,
) -> ApiResult<Json<ProviderAlerts>> {
    list_alerts(&state, ClinicScope::Clinic, query).await
}

#[utoipa::path(
    put,
    path = "/api/provider/clinic/alerts/{id}/read",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert marked read", body = AlertReadResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "clinic"
)]
#[instrument(skip(state))]
pub async fn clinic_mark_alert_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AlertReadResponse>> {
    let alert = state.services.provider.mark_alert_read(&ClinicScope::Clinic, &id).await?;
    Ok(Json(AlertReadResponse::new(alert)))
}

/// Demo hook: raise a BP alert for a random patient
#[utoipa::path(
    post,
    path = "/api/provider/clinic/simulate",
    responses(
        (status = 200, description = "Simulated alert created", body = SimulationResponse),
        (status = 404, description = "Simulation disabled or no patients", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "clinic"
)]
#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn simulate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<SimulationResponse>> {
    let simulated = state.services.provider.simulate().await?;
    info!("Simulated {} alert {} for patient {}", simulated.alert.alert_type, simulated.alert.id, simulated.patient.id);
    Ok(Json(SimulationResponse {
        message: "Simulation alert created".to_string(),
        patient: simulated.patient,
    }))
}
