//! Commands and queries for the customer domain.
//!
//! Each carries a [`Validator`] that the service runs before the handler.

use repository::FindOptions;
use serde::{Deserialize, Serialize};

use crate::enumeration::Enumeration;
use crate::validation::{Validate, Validator, is_guid, is_non_nil_guid};

use super::{Customer, CustomerModel, CustomerStatus};

/// Largest page a `FindAllCustomers` query may request.
pub const MAX_PAGE_SIZE: usize = 1000;

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Create a new customer. The model must not carry an id.
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub model: CustomerModel,
}

impl CreateCustomer {
    pub fn new(model: CustomerModel) -> Self {
        Self { model }
    }
}

impl Validate for CreateCustomer {
    fn validator() -> Validator<Self> {
        Validator::new()
            .rule(
                "id",
                |cmd: &Self| blank(&cmd.model.id),
                "Id must be empty when creating a customer",
            )
            .rule(
                "first_name",
                |cmd: &Self| !cmd.model.first_name.trim().is_empty(),
                "First name is required",
            )
            .rule(
                "last_name",
                |cmd: &Self| !cmd.model.last_name.trim().is_empty(),
                "Last name is required",
            )
            .rule(
                "email",
                |cmd: &Self| !cmd.model.email.trim().is_empty(),
                "Email is required",
            )
    }
}

/// Update the customer at `id` with the values in `model`.
///
/// `id` is the identifier the caller addressed (the route), which must
/// match the one in the model.
#[derive(Debug, Clone)]
pub struct UpdateCustomer {
    pub id: String,
    pub model: CustomerModel,
}

impl UpdateCustomer {
    pub fn new(id: impl Into<String>, model: CustomerModel) -> Self {
        Self {
            id: id.into(),
            model,
        }
    }
}

impl Validate for UpdateCustomer {
    fn validator() -> Validator<Self> {
        Validator::new()
            .rule(
                "id",
                |cmd: &Self| cmd.model.id.as_deref().is_some_and(is_non_nil_guid),
                "Id must be a valid GUID",
            )
            .rule(
                "id",
                |cmd: &Self| {
                    cmd.model
                        .id
                        .as_deref()
                        .is_some_and(|id| id.trim().eq_ignore_ascii_case(cmd.id.trim()))
                },
                "Id must match the addressed customer",
            )
            .rule(
                "concurrency_version",
                |cmd: &Self| cmd.model.concurrency_version.as_deref().is_some_and(is_guid),
                "Concurrency version is required",
            )
            .rule(
                "first_name",
                |cmd: &Self| !cmd.model.first_name.trim().is_empty(),
                "First name is required",
            )
            .rule(
                "last_name",
                |cmd: &Self| !cmd.model.last_name.trim().is_empty(),
                "Last name is required",
            )
            .rule(
                "email",
                |cmd: &Self| !cmd.model.email.trim().is_empty(),
                "Email is required",
            )
    }
}

/// Delete the customer with `id`.
#[derive(Debug, Clone)]
pub struct DeleteCustomer {
    pub id: String,
}

impl DeleteCustomer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Validate for DeleteCustomer {
    fn validator() -> Validator<Self> {
        Validator::new().rule(
            "id",
            |cmd: &Self| is_non_nil_guid(&cmd.id),
            "Id must be a valid GUID",
        )
    }
}

/// Load the customer with `id`.
#[derive(Debug, Clone)]
pub struct FindCustomer {
    pub id: String,
}

impl FindCustomer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Validate for FindCustomer {
    fn validator() -> Validator<Self> {
        Validator::new().rule(
            "id",
            |query: &Self| is_non_nil_guid(&query.id),
            "Id must be a valid GUID",
        )
    }
}

/// Field a customer listing can be ordered by.
const ORDERABLE: [&str; 3] = ["first_name", "last_name", "email"];

/// List customers, optionally filtered, ordered and paged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindAllCustomers {
    /// Exact status name.
    pub status: Option<String>,
    /// Case-insensitive substring of the email address.
    pub email: Option<String>,
    /// Case-insensitive substring of the last name.
    pub last_name: Option<String>,
    pub order_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

impl Validate for FindAllCustomers {
    fn validator() -> Validator<Self> {
        Validator::new()
            .rule(
                "status",
                |query: &Self| {
                    blank(&query.status)
                        || query
                            .status
                            .as_deref()
                            .is_some_and(|s| CustomerStatus::from_name(s.trim()).is_some())
                },
                "Unknown status",
            )
            .rule(
                "order_by",
                |query: &Self| {
                    query
                        .order_by
                        .as_deref()
                        .is_none_or(|field| ORDERABLE.contains(&field))
                },
                format!("Order by must be one of {}", ORDERABLE.join(", ")),
            )
            .rule(
                "take",
                |query: &Self| query.take.is_none_or(|take| (1..=MAX_PAGE_SIZE).contains(&take)),
                format!("Take must be between 1 and {MAX_PAGE_SIZE}"),
            )
    }
}

impl FindAllCustomers {
    /// Translates the query into repository options.
    pub fn to_options(&self) -> FindOptions<Customer> {
        let mut options = FindOptions::new();

        if let Some(status) = self
            .status
            .as_deref()
            .and_then(|s| CustomerStatus::from_name(s.trim()))
        {
            options = options.filter(move |c: &Customer| c.status() == status);
        }
        if let Some(email) = non_blank(&self.email) {
            options = options.filter(move |c: &Customer| c.email().as_str().contains(&email));
        }
        if let Some(last_name) = non_blank(&self.last_name) {
            options = options
                .filter(move |c: &Customer| c.last_name().to_lowercase().contains(&last_name));
        }

        options = match self.order_by.as_deref() {
            Some("first_name") => options.order_by_key(|c: &Customer| c.first_name().to_lowercase()),
            Some("last_name") => options.order_by_key(|c: &Customer| c.last_name().to_lowercase()),
            Some("email") => options.order_by_key(|c: &Customer| c.email().to_string()),
            _ => options,
        };
        options = options.descending(self.descending);

        if let Some(skip) = self.skip {
            options = options.skip(skip);
        }
        if let Some(take) = self.take {
            options = options.take(take);
        }
        options
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use common::ConcurrencyToken;

    use super::*;
    use crate::customer::CustomerId;

    fn fields(err: crate::DomainError) -> Vec<String> {
        err.failures()
            .into_iter()
            .filter_map(|f| f.field)
            .collect()
    }

    #[test]
    fn create_rejects_an_id() {
        let model = CustomerModel::new("A", "B", "a@b.io").with_id(CustomerId::new());
        let err = CreateCustomer::new(model).validate().unwrap_err();
        assert_eq!(fields(err), vec!["id"]);
    }

    #[test]
    fn create_reports_all_missing_fields() {
        let err = CreateCustomer::new(CustomerModel::default())
            .validate()
            .unwrap_err();
        assert_eq!(fields(err), vec!["first_name", "last_name", "email"]);
    }

    #[test]
    fn update_requires_matching_id_and_version() {
        let id = CustomerId::new();
        let valid = CustomerModel::new("A", "B", "a@b.io")
            .with_id(id)
            .with_concurrency_version(ConcurrencyToken::issue());
        assert!(UpdateCustomer::new(id.to_string(), valid.clone()).validate().is_ok());

        let err = UpdateCustomer::new(CustomerId::new().to_string(), valid.clone())
            .validate()
            .unwrap_err();
        assert_eq!(fields(err), vec!["id"]);

        let unversioned = CustomerModel {
            concurrency_version: None,
            ..valid
        };
        let err = UpdateCustomer::new(id.to_string(), unversioned)
            .validate()
            .unwrap_err();
        assert_eq!(fields(err), vec!["concurrency_version"]);
    }

    #[test]
    fn update_rejects_non_guid_id() {
        let model = CustomerModel {
            id: Some("abc".to_string()),
            concurrency_version: Some(ConcurrencyToken::issue().to_string()),
            ..CustomerModel::new("A", "B", "a@b.io")
        };
        let err = UpdateCustomer::new("abc", model).validate().unwrap_err();
        assert_eq!(fields(err), vec!["id"]);
    }

    #[test]
    fn find_and_delete_require_guid() {
        assert!(FindCustomer::new("nope").validate().is_err());
        assert!(DeleteCustomer::new(CustomerId::new().to_string()).validate().is_ok());
    }

    #[test]
    fn find_all_validates_options() {
        let query = FindAllCustomers {
            status: Some("Vip".to_string()),
            order_by: Some("age".to_string()),
            take: Some(0),
            ..FindAllCustomers::default()
        };
        let err = query.validate().unwrap_err();
        assert_eq!(fields(err), vec!["status", "order_by", "take"]);
        assert!(FindAllCustomers::default().validate().is_ok());
    }

    #[test]
    fn find_all_builds_options() {
        let a = Customer::create("Ann", "Zed", "ann@example.com").unwrap();
        let b = Customer::create("Bob", "young", "bob@example.com").unwrap();
        let c = Customer::create("Cid", "Xu", "cid@other.org").unwrap();

        let query = FindAllCustomers {
            email: Some("EXAMPLE".to_string()),
            order_by: Some("last_name".to_string()),
            ..FindAllCustomers::default()
        };
        let names: Vec<_> = query
            .to_options()
            .apply(vec![a.clone(), b.clone(), c.clone()])
            .iter()
            .map(|c| c.first_name().to_string())
            .collect();
        assert_eq!(names, vec!["Bob", "Ann"]);

        let query = FindAllCustomers {
            status: Some("Lead".to_string()),
            order_by: Some("first_name".to_string()),
            descending: true,
            skip: Some(1),
            take: Some(1),
            ..FindAllCustomers::default()
        };
        let names: Vec<_> = query
            .to_options()
            .apply(vec![a, b, c])
            .iter()
            .map(|c| c.first_name().to_string())
            .collect();
        assert_eq!(names, vec!["Bob"]);
    }
}
