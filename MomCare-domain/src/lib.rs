// MomCare Domain
// This crate contains the business logic for the MomCare maternal health API

// Health assistant
pub mod assistant;

// Authentication
pub mod auth;

// Clinical rules
pub mod clinical;

// Configuration
pub mod config;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Realtime and push notifications
pub mod notify;

// Services that implement business logic
pub mod services;

// Re-export the database module from the data crate for convenience
pub use mom_care_data::database;

// Testing utilities - only available in tests or with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
