//! Domain error types.

use std::time::Duration;

use repository::RepositoryError;
use serde::Serialize;
use thiserror::Error;

/// A single rule violation, optionally tied to an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// A failure not attributable to one field.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Classification every failure maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    /// Malformed or missing input, detected before any mutation.
    Validation,
    /// A domain invariant was violated.
    BusinessRule,
    /// The referenced aggregate does not exist.
    NotFound,
    /// The concurrency token no longer matched at write time.
    Concurrency,
    /// Anything else; surfaced generically.
    Unclassified,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Validation",
            ErrorCategory::BusinessRule => "BusinessRule",
            ErrorCategory::NotFound => "NotFound",
            ErrorCategory::Concurrency => "Concurrency",
            ErrorCategory::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more input rules failed.
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationFailure>),

    /// A business rule was violated.
    #[error("{message}")]
    BusinessRule { rule: &'static str, message: String },

    /// Aggregate not found.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Someone else wrote the aggregate first.
    #[error("{entity} {id} was modified by someone else")]
    ConcurrencyConflict { entity: &'static str, id: String },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The handler did not finish within its time budget.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// An infrastructure error from the repository.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

fn join(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    /// Shorthand for a single-field validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![ValidationFailure::new(field, message)])
    }

    pub fn business_rule(rule: &'static str, message: impl Into<String>) -> Self {
        DomainError::BusinessRule {
            rule,
            message: message.into(),
        }
    }

    /// Returns the category this failure is classified as.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DomainError::Validation(_) => ErrorCategory::Validation,
            DomainError::BusinessRule { .. } => ErrorCategory::BusinessRule,
            DomainError::NotFound { .. } => ErrorCategory::NotFound,
            DomainError::ConcurrencyConflict { .. } => ErrorCategory::Concurrency,
            DomainError::Cancelled | DomainError::Timeout(_) | DomainError::Repository(_) => {
                ErrorCategory::Unclassified
            }
        }
    }

    /// Returns true if retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Repository(RepositoryError::Database(_)))
    }

    /// The failures as a list, one entry for non-validation errors.
    pub fn failures(&self) -> Vec<ValidationFailure> {
        match self {
            DomainError::Validation(failures) => failures.clone(),
            other => vec![ValidationFailure::general(other.to_string())],
        }
    }
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            RepositoryError::ConcurrencyConflict { entity, id, .. }
            | RepositoryError::AlreadyExists { entity, id } => {
                DomainError::ConcurrencyConflict { entity, id }
            }
            RepositoryError::Cancelled => DomainError::Cancelled,
            other => DomainError::Repository(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
