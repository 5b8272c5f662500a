use thiserror::Error;
use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Not found error
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Date parsing error
    #[error("Date parsing error: {0}")]
    DateParse(String),

    /// Blocking task failed to complete
    #[error("Database task failed: {0}")]
    Task(String),
}

impl RepositoryError {
    /// Map a unique constraint violation to `Conflict`, anything else to `Sqlite`
    pub fn from_insert(error: rusqlite::Error, conflict_message: &str) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Conflict(conflict_message.to_string())
            }
            _ => RepositoryError::Sqlite(error),
        }
    }
}
