//! Customer aggregate.

use common::{AuditState, ConcurrencyToken};
use repository::Entity;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::result::ResultExt;
use crate::rules::Rules;

use super::{CustomerEvent, CustomerId, CustomerStatus, EmailAddress};

/// Longest accepted first or last name.
pub const NAME_MAX_LENGTH: usize = 128;

/// Unique key under which a customer's email is claimed in the store.
pub const EMAIL_KEY: &str = "email";

/// Last name rejected by the `LastNameNotAllowed` business rule.
const DISALLOWED_LAST_NAME: &str = "notallowed";

/// A customer.
///
/// Instances are only produced by [`Customer::create`] or by loading a
/// persisted customer, so every instance satisfies the name and email rules.
/// Mutators validate first and change nothing when validation fails; they
/// register an event only when a value actually changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: EmailAddress,
    #[serde(default)]
    status: CustomerStatus,
    #[serde(default)]
    concurrency_token: ConcurrencyToken,
    #[serde(default)]
    audit: AuditState,
    #[serde(skip)]
    events: Vec<CustomerEvent>,
}

fn name_rules<'a>(first_name: &'a str, last_name: &'a str) -> Rules<'a> {
    Rules::new()
        .required("first_name", "First name", first_name)
        .required("last_name", "Last name", last_name)
        .max_length("first_name", "First name", first_name, NAME_MAX_LENGTH)
        .max_length("last_name", "Last name", last_name, NAME_MAX_LENGTH)
        .business(
            "LastNameNotAllowed",
            move || !last_name.trim().eq_ignore_ascii_case(DISALLOWED_LAST_NAME),
            format!("Last name '{}' is not allowed", last_name.trim()),
        )
}

impl Customer {
    /// Creates a new customer in the default status and registers
    /// `CustomerCreated`.
    pub fn create(first_name: &str, last_name: &str, email: &str) -> Result<Self> {
        name_rules(first_name, last_name)
            .check()
            .bind(|()| EmailAddress::create(email))
            .map(|email| Customer {
                id: CustomerId::new(),
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email,
                status: CustomerStatus::default(),
                concurrency_token: ConcurrencyToken::unset(),
                audit: AuditState::default(),
                events: Vec::new(),
            })
            .tap_mut(|customer| {
                let event = CustomerEvent::created(
                    customer.id,
                    &customer.first_name,
                    &customer.last_name,
                    &customer.email,
                );
                customer.events.push(event);
            })
    }

    pub fn change_name(&mut self, first_name: &str, last_name: &str) -> Result<&mut Self> {
        name_rules(first_name, last_name).check()?;

        let (first_name, last_name) = (first_name.trim(), last_name.trim());
        if self.first_name != first_name || self.last_name != last_name {
            self.first_name = first_name.to_string();
            self.last_name = last_name.to_string();
            self.events
                .push(CustomerEvent::name_changed(self.id, first_name, last_name));
        }
        Ok(self)
    }

    pub fn change_email(&mut self, email: &str) -> Result<&mut Self> {
        let email = EmailAddress::create(email)?;
        if self.email != email {
            self.events
                .push(CustomerEvent::email_changed(self.id, &self.email, &email));
            self.email = email;
        }
        Ok(self)
    }

    /// Any status may be assigned; the type admits no invalid value.
    pub fn change_status(&mut self, status: CustomerStatus) -> &mut Self {
        if self.status != status {
            self.events
                .push(CustomerEvent::status_changed(self.id, self.status, status));
            self.status = status;
        }
        self
    }

    /// Marks the customer for deletion by registering `CustomerDeleted`.
    pub fn delete(&mut self) -> &mut Self {
        self.events.push(CustomerEvent::deleted(self.id));
        self
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }

    pub fn concurrency_token(&self) -> ConcurrencyToken {
        self.concurrency_token
    }

    pub fn audit(&self) -> &AuditState {
        &self.audit
    }

    /// Events registered and not yet taken.
    pub fn pending_events(&self) -> &[CustomerEvent] {
        &self.events
    }
}

impl Entity for Customer {
    type Id = CustomerId;
    type Event = CustomerEvent;

    fn entity_type() -> &'static str {
        "Customer"
    }

    fn id(&self) -> CustomerId {
        self.id
    }

    fn concurrency_token(&self) -> ConcurrencyToken {
        self.concurrency_token
    }

    fn set_concurrency_token(&mut self, token: ConcurrencyToken) {
        self.concurrency_token = token;
    }

    fn audit_state(&self) -> &AuditState {
        &self.audit
    }

    fn audit_state_mut(&mut self) -> &mut AuditState {
        &mut self.audit
    }

    fn take_events(&mut self) -> Vec<CustomerEvent> {
        std::mem::take(&mut self.events)
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![(EMAIL_KEY, self.email.to_string())]
    }
}
