//! Shared primitive types for the customer service.
//!
//! - `typed_id!` for GUID-backed identifiers
//! - `ConcurrencyToken` for optimistic concurrency on writes
//! - `AuditState` for created/updated/deleted metadata

pub mod audit;
pub mod types;

pub use audit::AuditState;
pub use types::ConcurrencyToken;
pub use uuid::Uuid;
