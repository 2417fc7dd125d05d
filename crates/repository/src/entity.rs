//! Traits persisted aggregates implement.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{AuditState, ConcurrencyToken};

/// Trait for domain events.
///
/// Domain events are immutable facts registered by an aggregate during a
/// successful mutation and published once the write has been committed.
pub trait DomainEvent: Debug + Clone + Send + Sync + 'static {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}

/// An aggregate root that can be stored by a [`Repository`](crate::Repository).
///
/// Pending events must not be part of the serialized form; stores persist
/// the state and the decorators take care of the events.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Typed identifier of the aggregate.
    type Id: Copy + Eq + Hash + Debug + Display + Into<Uuid> + Send + Sync + 'static;

    /// Events the aggregate registers.
    type Event: DomainEvent;

    /// Returns the aggregate type name, used as the storage discriminator.
    fn entity_type() -> &'static str;

    /// Returns the aggregate's identifier.
    fn id(&self) -> Self::Id;

    /// Returns the token the aggregate was read with.
    fn concurrency_token(&self) -> ConcurrencyToken;

    /// Replaces the concurrency token.
    fn set_concurrency_token(&mut self, token: ConcurrencyToken);

    fn audit_state(&self) -> &AuditState;

    fn audit_state_mut(&mut self) -> &mut AuditState;

    /// Drains the events registered since the last call.
    fn take_events(&mut self) -> Vec<Self::Event>;

    /// Values no two stored aggregates of this type may share, as
    /// `(key, value)` pairs. Stores reject a write that would duplicate one
    /// with [`RepositoryError::UniqueViolation`](crate::RepositoryError::UniqueViolation).
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}
