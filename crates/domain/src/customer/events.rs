//! Customer domain events.

use chrono::{DateTime, Utc};
use repository::DomainEvent;
use serde::{Deserialize, Serialize};

use super::{CustomerId, CustomerStatus, EmailAddress};

/// Something that happened to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CustomerEvent {
    /// Customer was created.
    CustomerCreated(CustomerCreatedData),

    /// First or last name changed.
    CustomerNameChanged(CustomerNameChangedData),

    /// Email address changed.
    CustomerEmailChanged(CustomerEmailChangedData),

    /// Status changed.
    CustomerStatusChanged(CustomerStatusChangedData),

    /// Customer was deleted.
    CustomerDeleted(CustomerDeletedData),
}

impl DomainEvent for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerCreated(_) => "CustomerCreated",
            CustomerEvent::CustomerNameChanged(_) => "CustomerNameChanged",
            CustomerEvent::CustomerEmailChanged(_) => "CustomerEmailChanged",
            CustomerEvent::CustomerStatusChanged(_) => "CustomerStatusChanged",
            CustomerEvent::CustomerDeleted(_) => "CustomerDeleted",
        }
    }
}

impl CustomerEvent {
    /// The customer the event refers to.
    pub fn customer_id(&self) -> CustomerId {
        match self {
            CustomerEvent::CustomerCreated(data) => data.customer_id,
            CustomerEvent::CustomerNameChanged(data) => data.customer_id,
            CustomerEvent::CustomerEmailChanged(data) => data.customer_id,
            CustomerEvent::CustomerStatusChanged(data) => data.customer_id,
            CustomerEvent::CustomerDeleted(data) => data.customer_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomerEvent::CustomerCreated(data) => data.occurred_at,
            CustomerEvent::CustomerNameChanged(data) => data.occurred_at,
            CustomerEvent::CustomerEmailChanged(data) => data.occurred_at,
            CustomerEvent::CustomerStatusChanged(data) => data.occurred_at,
            CustomerEvent::CustomerDeleted(data) => data.occurred_at,
        }
    }

    pub(crate) fn created(
        customer_id: CustomerId,
        first_name: &str,
        last_name: &str,
        email: &EmailAddress,
    ) -> Self {
        CustomerEvent::CustomerCreated(CustomerCreatedData {
            customer_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.clone(),
            occurred_at: Utc::now(),
        })
    }

    pub(crate) fn name_changed(customer_id: CustomerId, first_name: &str, last_name: &str) -> Self {
        CustomerEvent::CustomerNameChanged(CustomerNameChangedData {
            customer_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            occurred_at: Utc::now(),
        })
    }

    pub(crate) fn email_changed(
        customer_id: CustomerId,
        previous: &EmailAddress,
        email: &EmailAddress,
    ) -> Self {
        CustomerEvent::CustomerEmailChanged(CustomerEmailChangedData {
            customer_id,
            previous: previous.clone(),
            email: email.clone(),
            occurred_at: Utc::now(),
        })
    }

    pub(crate) fn status_changed(
        customer_id: CustomerId,
        previous: CustomerStatus,
        status: CustomerStatus,
    ) -> Self {
        CustomerEvent::CustomerStatusChanged(CustomerStatusChangedData {
            customer_id,
            previous,
            status,
            occurred_at: Utc::now(),
        })
    }

    pub(crate) fn deleted(customer_id: CustomerId) -> Self {
        CustomerEvent::CustomerDeleted(CustomerDeletedData {
            customer_id,
            occurred_at: Utc::now(),
        })
    }
}

/// Data for CustomerCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCreatedData {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CustomerNameChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerNameChangedData {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CustomerEmailChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerEmailChangedData {
    pub customer_id: CustomerId,
    pub previous: EmailAddress,
    pub email: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CustomerStatusChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStatusChangedData {
    pub customer_id: CustomerId,
    pub previous: CustomerStatus,
    pub status: CustomerStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Data for CustomerDeleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDeletedData {
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}
