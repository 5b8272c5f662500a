use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use tracing::debug;
use utoipa::OpenApi;

use mom_care_domain::auth::{auth_middleware, authorize, configure_security};

use crate::api::handlers::{alerts, auth, chat, health, notifications, pregnancy, provider, vitals, ws};
use crate::api::state::AppState;
use crate::openapi::{configure_swagger_routes, ApiDoc};

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/ws", get(ws::ws_handler));

    let patient_routes = Router::new()
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        .route("/api/auth/mode", post(auth::switch_mode))
        .route("/api/auth/update-fcm", post(auth::update_fcm_token))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/vitals", get(vitals::list_vitals).post(vitals::log_vital))
        .route("/api/vitals/latest", get(vitals::latest_vitals))
        .route("/api/pregnancy", get(pregnancy::current_pregnancy).post(pregnancy::start_pregnancy))
        .route("/api/pregnancy/kicks", post(pregnancy::log_kicks))
        .route("/api/pregnancy/contractions", post(pregnancy::log_contraction))
        .route("/api/pregnancy/stats", get(pregnancy::pregnancy_stats))
        .route("/api/alerts", get(alerts::list_alerts))
        .route("/api/alerts/:id/read", put(alerts::mark_alert_read))
        .route("/api/chat", post(chat::send_chat))
        .route("/api/chat/history", get(chat::chat_history));

    // Role checks run after authentication, so they sit inside the auth layer
    let provider_routes = Router::new()
        .route("/api/provider/patients", get(provider::patients))
        .route("/api/provider/patients/:id", get(provider::patient_detail))
        .route("/api/provider/alerts", get(provider::alerts))
        .route("/api/provider/alerts/:id/read", put(provider::mark_alert_read))
        .route("/api/provider/messages", post(provider::send_message))
        .route("/api/provider/messages/:patient_id", get(provider::conversation))
        .route("/api/provider/dashboard", get(provider::dashboard))
        .route("/api/provider/clinic/dashboard", get(provider::clinic_dashboard))
        .route("/api/provider/clinic/patients", get(provider::clinic_patients))
        .route("/api/provider/clinic/patients/:id", get(provider::clinic_patient_detail))
        .route("/api/provider/clinic/alerts", get(provider::clinic_alerts))
        .route("/api/provider/clinic/alerts/:id/read", put(provider::clinic_mark_alert_read))
        .route("/api/provider/clinic/simulate", post(provider::simulate))
        .route("/api/notifications/send", post(notifications::send))
        .route("/api/notifications/send-multiple", post(notifications::send_multiple))
        .route("/api/notifications/send-topic", post(notifications::send_topic))
        .route("/api/notifications/subscribe", post(notifications::subscribe))
        .route("/api/notifications/unsubscribe", post(notifications::unsubscribe))
        .route("/api/notifications/alert-pregnancy", post(notifications::alert_pregnancy))
        .layer(middleware::from_fn(authorize::require_provider()));

    let protected_routes = patient_routes
        .merge(provider_routes)
        .layer(middleware::from_fn_with_state(
            state.services.accounts.clone(),
            auth_middleware,
        ));

    debug!("API routes configured");

    let cors_origins = state.config.cors_origins.clone();
    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .merge(configure_swagger_routes(ApiDoc::openapi()));

    configure_security(app, &cors_origins).layer(TraceLayer::new_for_http())
}
