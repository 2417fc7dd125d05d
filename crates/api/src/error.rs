//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorCategory, ValidationFailure};
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be read (malformed JSON, bad query string).
    BadRequest(String),
    /// Any failure coming out of the domain layer.
    Domain(DomainError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub category: ErrorCategory,
    pub message: String,
    pub errors: Vec<ValidationFailure>,
}

impl ApiError {
    /// Status code and body for this error.
    pub fn to_parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    category: ErrorCategory::Validation,
                    message: message.clone(),
                    errors: vec![ValidationFailure::general(message.clone())],
                },
            ),
            ApiError::Domain(err) => domain_error_to_parts(err),
        }
    }
}

fn domain_error_to_parts(err: &DomainError) -> (StatusCode, ErrorBody) {
    let category = err.category();
    let status = match category {
        ErrorCategory::Validation | ErrorCategory::BusinessRule => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Concurrency => StatusCode::CONFLICT,
        ErrorCategory::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = if category == ErrorCategory::Unclassified {
        ErrorBody {
            category,
            message: "An unexpected error occurred".to_string(),
            errors: Vec::new(),
        }
    } else {
        ErrorBody {
            category,
            message: err.to_string(),
            errors: err.failures(),
        }
    };
    (status, body)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();
        metrics::counter!("http_errors_total", "category" => body.category.as_str()).increment(1);
        match &self {
            ApiError::Domain(err) if status.is_server_error() => {
                tracing::error!(error = %err, "internal server error");
            }
            _ => tracing::debug!(status = %status, message = %body.message, "request failed"),
        }
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn validation_is_bad_request_with_field_errors() {
        let (status, body) =
            ApiError::from(DomainError::validation("first_name", "First name is required"))
                .to_parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.category, ErrorCategory::Validation);
        assert_eq!(body.errors[0].field.as_deref(), Some("first_name"));
    }

    #[test]
    fn categories_map_to_status_codes() {
        let cases = [
            (
                DomainError::business_rule("Rule", "nope"),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::NotFound {
                    entity: "Customer",
                    id: "1".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::ConcurrencyConflict {
                    entity: "Customer",
                    id: "1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::Timeout(Duration::from_secs(1)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).to_parts().0, expected);
        }
    }

    #[test]
    fn unclassified_errors_hide_details() {
        let (_, body) = ApiError::from(DomainError::Cancelled).to_parts();
        assert_eq!(body.message, "An unexpected error occurred");
        assert!(body.errors.is_empty());
    }
}
