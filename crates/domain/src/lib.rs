//! Domain layer for the customer service.
//!
//! This crate provides:
//! - A Result discipline: [`DomainError`] with an [`ErrorCategory`] per
//!   failure and [`ResultExt`] combinators for chaining fallible steps
//! - Short-circuit [`Rules`] for aggregates and collecting [`Validator`]s
//!   for commands
//! - [`Enumeration`] for closed sets of named values
//! - The [`Customer`] aggregate and its [`CustomerService`]

pub mod customer;
pub mod enumeration;
pub mod error;
pub mod policy;
pub mod result;
pub mod rules;
pub mod validation;

pub use customer::{
    CreateCustomer, Customer, CustomerEvent, CustomerEventLogger, CustomerId, CustomerModel,
    CustomerService, CustomerStatus, DeleteCustomer, EmailAddress, EmailMustBeUnique,
    FindAllCustomers, FindCustomer, UpdateCustomer,
};
pub use enumeration::Enumeration;
pub use error::{DomainError, ErrorCategory, Result, ValidationFailure};
pub use policy::Policy;
pub use result::ResultExt;
pub use rules::Rules;
pub use validation::{Validate, Validator};
