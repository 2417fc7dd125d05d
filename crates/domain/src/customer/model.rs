//! Transport model for customers and its mapping to the aggregate.

use chrono::{DateTime, Utc};
use common::ConcurrencyToken;
use serde::{Deserialize, Serialize};

use crate::enumeration::Enumeration;
use crate::error::{DomainError, Result, ValidationFailure};

use super::{Customer, CustomerId, CustomerStatus};

/// Customer as exchanged with callers.
///
/// `id` and `concurrency_version` are strings so malformed values can be
/// reported as validation failures instead of deserialization errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CustomerModel {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: CustomerStatus) -> Self {
        self.status = Some(status.name().to_string());
        self
    }

    pub fn with_id(mut self, id: CustomerId) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_concurrency_version(mut self, token: ConcurrencyToken) -> Self {
        self.concurrency_version = Some(token.to_string());
        self
    }

    /// Parses the requested status, if one was given.
    pub fn parsed_status(&self) -> Result<Option<CustomerStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => CustomerStatus::from_name(name).map(Some).ok_or_else(|| {
                DomainError::validation("status", format!("Unknown status '{name}'"))
            }),
        }
    }

    /// Parses the identifier, if one was given.
    pub fn parsed_id(&self) -> Result<Option<CustomerId>> {
        parse_optional(self.id.as_deref(), "id", "Id")
    }

    /// Parses the concurrency version, if one was given.
    pub fn parsed_concurrency_version(&self) -> Result<Option<ConcurrencyToken>> {
        parse_optional(
            self.concurrency_version.as_deref(),
            "concurrency_version",
            "Concurrency version",
        )
    }
}

fn parse_optional<T: std::str::FromStr>(
    raw: Option<&str>,
    field: &'static str,
    label: &str,
) -> Result<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            DomainError::Validation(vec![ValidationFailure::new(
                field,
                format!("{label} must be a valid GUID"),
            )])
        }),
    }
}

impl From<&Customer> for CustomerModel {
    fn from(customer: &Customer) -> Self {
        let audit = customer.audit();
        Self {
            id: Some(customer.id().to_string()),
            first_name: customer.first_name().to_string(),
            last_name: customer.last_name().to_string(),
            email: customer.email().to_string(),
            status: Some(customer.status().name().to_string()),
            concurrency_version: Some(customer.concurrency_token().to_string()),
            created_at: audit.created_at,
            updated_at: audit.updated_at,
        }
    }
}

impl From<Customer> for CustomerModel {
    fn from(customer: Customer) -> Self {
        Self::from(&customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_field() {
        let customer = Customer::create("John", "Doe", "john@example.com").unwrap();
        let model = CustomerModel::from(&customer);

        assert_eq!(model.parsed_id().unwrap(), Some(customer.id()));
        assert_eq!(model.first_name, "John");
        assert_eq!(model.last_name, "Doe");
        assert_eq!(model.email, "john@example.com");
        assert_eq!(model.parsed_status().unwrap(), Some(CustomerStatus::Lead));
        assert_eq!(
            model.parsed_concurrency_version().unwrap(),
            Some(customer.concurrency_token())
        );
    }

    #[test]
    fn mapped_fields_rebuild_an_equivalent_customer() {
        let customer = Customer::create("Jane", "Roe", "jane@example.com").unwrap();
        let model = CustomerModel::from(&customer);

        let rebuilt = Customer::create(&model.first_name, &model.last_name, &model.email).unwrap();
        assert_eq!(rebuilt.first_name(), customer.first_name());
        assert_eq!(rebuilt.last_name(), customer.last_name());
        assert_eq!(rebuilt.email(), customer.email());
        assert_eq!(rebuilt.status(), customer.status());
    }

    #[test]
    fn unknown_status_is_a_validation_failure() {
        let model = CustomerModel {
            status: Some("Vip".to_string()),
            ..CustomerModel::default()
        };
        let err = model.parsed_status().unwrap_err();
        assert_eq!(err.failures()[0].field.as_deref(), Some("status"));
    }

    #[test]
    fn blank_optional_fields_are_absent() {
        let model = CustomerModel {
            id: Some("  ".to_string()),
            status: Some(String::new()),
            ..CustomerModel::default()
        };
        assert_eq!(model.parsed_id().unwrap(), None);
        assert_eq!(model.parsed_status().unwrap(), None);
    }

    #[test]
    fn json_uses_snake_case_and_skips_empty_fields() {
        let model = CustomerModel::new("A", "B", "a@b.io");
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["first_name"], "A");
        assert!(json.get("id").is_none());

        let parsed: CustomerModel =
            serde_json::from_str(r#"{"first_name":"A","last_name":"B","email":"a@b.io"}"#).unwrap();
        assert_eq!(parsed, model);
    }
}
