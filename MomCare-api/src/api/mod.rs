pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;

pub use state::{AppState, StartupError};

/// Create the application router
pub fn create_application(state: AppState) -> Router {
    routes::create_app(state)
}
