//! Field-level validation of commands and queries.
//!
//! Unlike [`Rules`](crate::rules::Rules), a [`Validator`] runs every rule and
//! reports all failures at once.

use uuid::Uuid;

use crate::error::{DomainError, Result, ValidationFailure};

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct FieldRule<T> {
    field: &'static str,
    predicate: Predicate<T>,
    message: String,
}

/// A set of per-field rules over `T`.
pub struct Validator<T> {
    rules: Vec<FieldRule<T>>,
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> Validator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule: `predicate` must hold for `field`, else `message`.
    pub fn rule(
        mut self,
        field: &'static str,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.rules.push(FieldRule {
            field,
            predicate: Box::new(predicate),
            message: message.into(),
        });
        self
    }

    /// Evaluates every rule and returns the failures, if any.
    pub fn failures(&self, value: &T) -> Vec<ValidationFailure> {
        self.rules
            .iter()
            .filter(|rule| !(rule.predicate)(value))
            .map(|rule| ValidationFailure::new(rule.field, rule.message.clone()))
            .collect()
    }

    pub fn validate(&self, value: &T) -> Result<()> {
        let failures = self.failures(value);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(failures))
        }
    }
}

/// Commands and queries that carry their own validator.
pub trait Validate: Sized {
    fn validator() -> Validator<Self>;

    fn validate(&self) -> Result<()> {
        Self::validator().validate(self)
    }
}

/// True if `value` parses as a UUID.
pub fn is_guid(value: &str) -> bool {
    Uuid::parse_str(value.trim()).is_ok()
}

/// True if `value` parses as a UUID other than the nil UUID.
pub fn is_non_nil_guid(value: &str) -> bool {
    Uuid::parse_str(value.trim()).is_ok_and(|uuid| !uuid.is_nil())
}
