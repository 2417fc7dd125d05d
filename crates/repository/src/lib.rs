pub mod decorators;
pub mod entity;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod publisher;
pub mod query;
pub mod repository;

pub use common::{AuditState, ConcurrencyToken};
pub use decorators::{AuditRepository, EventPublishingRepository, LoggingRepository, decorate};
pub use entity::{DomainEvent, Entity};
pub use error::{RepositoryError, Result};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
pub use publisher::{EventHandler, EventPublisher, InProcessEventPublisher};
pub use query::FindOptions;
pub use repository::{Repository, RepositoryExt, SharedRepository};
pub use tokio_util::sync::CancellationToken;
