//! Customer domain: aggregate, value objects, commands and service.

mod aggregate;
mod commands;
mod events;
mod handlers;
mod model;
mod rules;
mod service;
mod status;
mod value_objects;

pub use aggregate::{Customer, EMAIL_KEY, NAME_MAX_LENGTH};
pub use commands::{
    CreateCustomer, DeleteCustomer, FindAllCustomers, FindCustomer, MAX_PAGE_SIZE, UpdateCustomer,
};
pub use events::{
    CustomerCreatedData, CustomerDeletedData, CustomerEmailChangedData, CustomerEvent,
    CustomerNameChangedData, CustomerStatusChangedData,
};
pub use handlers::CustomerEventLogger;
pub use model::CustomerModel;
pub use rules::EmailMustBeUnique;
pub use service::CustomerService;
pub use status::CustomerStatus;
pub use value_objects::{CustomerId, EMAIL_MAX_LENGTH, EmailAddress};
