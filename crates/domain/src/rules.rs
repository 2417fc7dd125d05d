//! Ordered, short-circuiting rule sets.
//!
//! A [`Rules`] list is evaluated front to back and stops at the first rule
//! that does not hold, returning that rule's error. Aggregate factories and
//! mutators use it so a failure leaves the aggregate untouched.

use crate::error::{DomainError, Result};

type Check<'a> = Box<dyn FnOnce() -> bool + 'a>;
type MakeError<'a> = Box<dyn FnOnce() -> DomainError + 'a>;

struct Rule<'a> {
    check: Check<'a>,
    error: MakeError<'a>,
}

/// A declarative list of predicate/error pairs.
#[derive(Default)]
pub struct Rules<'a> {
    rules: Vec<Rule<'a>>,
}

impl<'a> Rules<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary rule.
    pub fn add(
        mut self,
        check: impl FnOnce() -> bool + 'a,
        error: impl FnOnce() -> DomainError + 'a,
    ) -> Self {
        self.rules.push(Rule {
            check: Box::new(check),
            error: Box::new(error),
        });
        self
    }

    /// `value` must contain something other than whitespace.
    pub fn required(self, field: &'static str, label: &'static str, value: &'a str) -> Self {
        self.add(
            move || !value.trim().is_empty(),
            move || DomainError::validation(field, format!("{label} is required")),
        )
    }

    /// `value` must be at most `max` characters.
    pub fn max_length(
        self,
        field: &'static str,
        label: &'static str,
        value: &'a str,
        max: usize,
    ) -> Self {
        self.add(
            move || value.trim().chars().count() <= max,
            move || {
                DomainError::validation(field, format!("{label} must be at most {max} characters"))
            },
        )
    }

    /// A business rule; `holds` is evaluated only when reached.
    pub fn business(
        self,
        rule: &'static str,
        holds: impl FnOnce() -> bool + 'a,
        message: impl Into<String> + 'a,
    ) -> Self {
        self.add(holds, move || DomainError::business_rule(rule, message))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates the rules in order and returns the first failure.
    pub fn check(self) -> Result<()> {
        for rule in self.rules {
            if !(rule.check)() {
                return Err((rule.error)());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn empty_rules_pass() {
        assert!(Rules::new().check().is_ok());
    }

    #[test]
    fn first_failure_wins() {
        let err = Rules::new()
            .required("first_name", "First name", "")
            .required("last_name", "Last name", "")
            .check()
            .unwrap_err();

        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field.as_deref(), Some("first_name"));
        assert_eq!(failures[0].message, "First name is required");
    }

    #[test]
    fn later_rules_are_not_evaluated() {
        let evaluated = Cell::new(false);
        let result = Rules::new()
            .add(|| false, || DomainError::validation("a", "fails"))
            .add(
                || {
                    evaluated.set(true);
                    true
                },
                || DomainError::validation("b", "never"),
            )
            .check();

        assert!(result.is_err());
        assert!(!evaluated.get());
    }

    #[test]
    fn max_length_counts_characters() {
        let name = "é".repeat(4);
        assert!(Rules::new().max_length("n", "Name", &name, 4).check().is_ok());
        assert!(Rules::new().max_length("n", "Name", &name, 3).check().is_err());
    }

    #[test]
    fn whitespace_is_not_a_value() {
        assert!(Rules::new().required("n", "Name", "   ").check().is_err());
    }

    #[test]
    fn business_rules_are_categorized() {
        let err = Rules::new()
            .business("NoBob", || false, "Bob is not allowed")
            .check()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::BusinessRule);
        assert_eq!(err.to_string(), "Bob is not allowed");
    }
}
