// Public request and response bodies
pub mod auth;
pub mod common;
pub mod patient;
pub mod provider;

// Re-export common types for easier imports
pub use common::{ApiResult, ErrorResponse, MessageResponse};
