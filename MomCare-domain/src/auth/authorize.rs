use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, warn};

use super::logging::{log_access_denied, log_auth_event, AuthEvent, AuthEventType};
use super::AuthUser;
use crate::entities::Role;

fn forbidden_message(role: Role) -> &'static str {
    match role {
        Role::Provider => "Provider access required",
        Role::Patient => "Patient access required",
    }
}

/// Middleware for role-based access control
///
/// Runs after [`super::auth_middleware`]. Callers whose role differs get a 403.
pub async fn require_roles(req: Request<Body>, next: Next, role: Role) -> Response {
    let request_path = req.uri().path().to_string();

    match req.extensions().get::<AuthUser>() {
        Some(AuthUser(user)) if user.role == role => {
            debug!("User {} has required role for resource access: {}", user.id, request_path);
            next.run(req).await
        }
        Some(AuthUser(user)) => {
            warn!("User {} lacks required role {} for resource: {}", user.id, role, request_path);
            log_access_denied(&user.id, &request_path, &[role.to_string()]);

            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": forbidden_message(role),
                })),
            )
                .into_response()
        }
        None => {
            // auth_middleware must be layered before this one
            warn!("No user info found in request extensions for path: {}", request_path);
            let event = AuthEvent::new(AuthEventType::AccessDenied, None, false)
                .with_details("Authentication context missing in request extensions")
                .with_resource(request_path)
                .with_auth_method("rbac");
            log_auth_event(event);

            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "No auth token provided",
                })),
            )
                .into_response()
        }
    }
}

/// Middleware factory that requires a specific role for access
///
/// ```ignore
/// let provider_routes = Router::new()
///     .route("/dashboard", get(dashboard))
///     .layer(middleware::from_fn(require_role(Role::Provider)));
/// ```
pub fn require_role(
    role: Role,
) -> impl Fn(Request<Body>, Next) -> BoxFuture<'static, Response> + Clone + Send + 'static {
    move |req, next| Box::pin(require_roles(req, next, role))
}

/// Shorthand for `require_role(Role::Provider)`
pub fn require_provider(
) -> impl Fn(Request<Body>, Next) -> BoxFuture<'static, Response> + Clone + Send + 'static {
    require_role(Role::Provider)
}
