//! Health assistant: patient context, prompt building, text generation and
//! the rule-based replies used when no generator is available.

pub mod context;
pub mod fallback;
pub mod generator;

pub use context::PatientContext;
pub use generator::{AssistantError, HttpTextGenerator, TextGenerator};
