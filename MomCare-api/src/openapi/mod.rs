use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Swagger UI at `/swagger-ui`, serving the document at `/api-docs/openapi.json`
pub fn configure_swagger_routes(doc: utoipa::openapi::OpenApi) -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc)
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_check,

        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::me,
        crate::api::handlers::auth::update_me,
        crate::api::handlers::auth::switch_mode,
        crate::api::handlers::auth::update_fcm_token,
        crate::api::handlers::auth::logout,

        crate::api::handlers::vitals::log_vital,
        crate::api::handlers::vitals::list_vitals,
        crate::api::handlers::vitals::latest_vitals,

        crate::api::handlers::pregnancy::current_pregnancy,
        crate::api::handlers::pregnancy::start_pregnancy,
        crate::api::handlers::pregnancy::log_kicks,
        crate::api::handlers::pregnancy::log_contraction,
        crate::api::handlers::pregnancy::pregnancy_stats,

        crate::api::handlers::alerts::list_alerts,
        crate::api::handlers::alerts::mark_alert_read,

        crate::api::handlers::provider::patients,
        crate::api::handlers::provider::patient_detail,
        crate::api::handlers::provider::alerts,
        crate::api::handlers::provider::mark_alert_read,
        crate::api::handlers::provider::conversation,
        crate::api::handlers::provider::send_message,
        crate::api::handlers::provider::dashboard,
        crate::api::handlers::provider::clinic_dashboard,
        crate::api::handlers::provider::clinic_patients,
        crate::api::handlers::provider::clinic_patient_detail,
        crate::api::handlers::provider::clinic_alerts,
        crate::api::handlers::provider::clinic_mark_alert_read,
        crate::api::handlers::provider::simulate,

        crate::api::handlers::chat::send_chat,
        crate::api::handlers::chat::chat_history,

        crate::api::handlers::notifications::send,
        crate::api::handlers::notifications::send_multiple,
        crate::api::handlers::notifications::send_topic,
        crate::api::handlers::notifications::subscribe,
        crate::api::handlers::notifications::unsubscribe,
        crate::api::handlers::notifications::alert_pregnancy
    ),
    components(
        schemas(
            // Wire types
            crate::entities::ErrorResponse,
            crate::entities::MessageResponse,
            crate::entities::auth::SessionUser,
            crate::entities::auth::SessionResponse,
            crate::entities::auth::ProfileUpdatedResponse,
            crate::entities::auth::ModeRequest,
            crate::entities::auth::ModeResponse,
            crate::entities::auth::FcmTokenRequest,
            crate::entities::patient::AlertSummary,
            crate::entities::patient::VitalLoggedResponse,
            crate::entities::patient::VitalListResponse,
            crate::entities::patient::LatestVitalsResponse,
            crate::entities::patient::PregnancyResponse,
            crate::entities::patient::StartPregnancyRequest,
            crate::entities::patient::PregnancyStartedResponse,
            crate::entities::patient::KickLoggedResponse,
            crate::entities::patient::ContractionLoggedResponse,
            crate::entities::patient::AlertListResponse,
            crate::entities::patient::AlertReadResponse,
            crate::entities::patient::ChatRequest,
            crate::entities::patient::ChatLine,
            crate::entities::patient::ChatResponse,
            crate::entities::patient::MessageListResponse,
            crate::entities::provider::SendMessageRequest,
            crate::entities::provider::MessageSentResponse,
            crate::entities::provider::SimulationResponse,

            // Domain entities
            mom_care_domain::entities::User,
            mom_care_domain::entities::Pregnancy,
            mom_care_domain::entities::PregnancyDetails,
            mom_care_domain::entities::RiskFactor,
            mom_care_domain::entities::Vital,
            mom_care_domain::entities::Alert,
            mom_care_domain::entities::Message,
            mom_care_domain::entities::Role,
            mom_care_domain::entities::Mode,
            mom_care_domain::entities::BloodType,
            mom_care_domain::entities::VitalType,
            mom_care_domain::entities::AlertType,
            mom_care_domain::entities::RiskLevel,
            mom_care_domain::entities::Severity,

            // Service payloads
            mom_care_domain::services::RegisterRequest,
            mom_care_domain::services::LoginRequest,
            mom_care_domain::services::UpdateProfileRequest,
            mom_care_domain::services::UserProfile,
            mom_care_domain::services::Profile,
            mom_care_domain::services::LogVitalRequest,
            mom_care_domain::services::LatestVitals,
            mom_care_domain::services::KickRequest,
            mom_care_domain::services::KickOutcome,
            mom_care_domain::services::ContractionRequest,
            mom_care_domain::services::ContractionOutcome,
            mom_care_domain::services::PregnancyStats,
            mom_care_domain::services::WeeklyStats,
            mom_care_domain::services::PatientList,
            mom_care_domain::services::PatientSummary,
            mom_care_domain::services::ProviderAlerts,
            mom_care_domain::services::AlertWithPatient,
            mom_care_domain::services::Dashboard,
            mom_care_domain::services::PatientDetail,
            mom_care_domain::services::provider::PatientRef,
            mom_care_domain::services::provider::DashboardStats,
            mom_care_domain::services::provider::PatientProfile,
            mom_care_domain::services::provider::PregnancySnapshot,
            mom_care_domain::services::provider::VitalGroups,
            mom_care_domain::services::provider::BpPoint,
            mom_care_domain::services::provider::WeightPoint,
            mom_care_domain::services::provider::LogEntry,
            mom_care_domain::services::SendRequest,
            mom_care_domain::services::SendMultipleRequest,
            mom_care_domain::services::SendTopicRequest,
            mom_care_domain::services::TopicRequest,
            mom_care_domain::services::PregnancyAlertRequest,
            mom_care_domain::services::SendReceipt,
            mom_care_domain::services::MulticastReceipt,
            mom_care_domain::services::TopicReceipt,

            // Health
            mom_care_domain::health::SystemHealth,
            mom_care_domain::health::SystemStatus,
            mom_care_domain::health::ComponentStatus,
            mom_care_domain::health::HealthComponent
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, login and profile"),
        (name = "vitals", description = "Vital sign logging and history"),
        (name = "pregnancy", description = "Pregnancy tracking, kick counts and contractions"),
        (name = "alerts", description = "Patient alerts"),
        (name = "provider", description = "Provider panel"),
        (name = "clinic", description = "Clinic-wide provider views"),
        (name = "chat", description = "Health assistant"),
        (name = "notifications", description = "Provider push notifications")
    ),
    info(
        title = "MomCare API",
        version = "0.1.0",
        description = "Maternal health tracking for patients and their care providers",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
