// MomCare Data
// This crate handles persistence for the MomCare application

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
