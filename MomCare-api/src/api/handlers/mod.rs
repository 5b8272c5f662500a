pub mod alerts;
pub mod auth;
pub mod chat;
pub mod health;
pub mod notifications;
pub mod pregnancy;
pub mod provider;
pub mod vitals;
pub mod ws;

pub use health::health_check;
pub use ws::ws_handler;
