use thiserror::Error;

use crate::ConcurrencyToken;

/// Errors that can occur when interacting with a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row exists for the requested identifier.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// An insert collided with an existing row.
    #[error("{entity} with id {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },

    /// A write would give a unique key a value another row already holds.
    #[error("{entity} with {key} '{value}' already exists")]
    UniqueViolation {
        entity: &'static str,
        key: &'static str,
        value: String,
    },

    /// The caller's concurrency token no longer matches the stored row.
    #[error(
        "Concurrency conflict for {entity} {id}: expected token {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        entity: &'static str,
        id: String,
        expected: ConcurrencyToken,
        actual: ConcurrencyToken,
    },

    /// The operation observed cancellation before anything was applied.
    #[error("Operation cancelled")]
    Cancelled,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An event handler failed after the write was committed.
    #[error("Event handler {handler} failed: {message}")]
    Publish {
        handler: &'static str,
        message: String,
    },
}

impl RepositoryError {
    /// Short label used for log fields and metric outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryError::NotFound { .. } => "not_found",
            RepositoryError::AlreadyExists { .. } => "already_exists",
            RepositoryError::UniqueViolation { .. } => "unique_violation",
            RepositoryError::ConcurrencyConflict { .. } => "concurrency_conflict",
            RepositoryError::Cancelled => "cancelled",
            RepositoryError::Database(_) => "database",
            RepositoryError::Migration(_) => "migration",
            RepositoryError::Serialization(_) => "serialization",
            RepositoryError::Publish { .. } => "publish",
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
