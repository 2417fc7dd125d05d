//! Cross-cutting behaviors layered around a concrete repository.
//!
//! Each decorator implements [`Repository`] and delegates to the repository
//! it wraps. [`decorate`] composes the standard chain:
//!
//! ```text
//! LoggingRepository            start/end of every operation
//!   └─ EventPublishingRepository  publishes pending events after the write
//!        └─ AuditRepository       stamps created/updated before the write
//!             └─ store            in-memory or PostgreSQL
//! ```

mod audit;
mod events;
mod logging;
#[cfg(test)]
pub(crate) mod recorder;

pub use audit::AuditRepository;
pub use events::EventPublishingRepository;
pub use logging::LoggingRepository;

use std::sync::Arc;

use crate::{Entity, EventPublisher, Repository, SharedRepository};

/// Wraps a store in the standard decorator chain.
pub fn decorate<E, R, P>(
    store: R,
    publisher: P,
    audit_user: impl Into<String>,
) -> SharedRepository<E>
where
    E: Entity,
    R: Repository<E> + 'static,
    P: EventPublisher<E::Event> + 'static,
{
    let audited = AuditRepository::new(store, audit_user);
    let publishing = EventPublishingRepository::new(audited, publisher);
    Arc::new(LoggingRepository::new(publishing))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::entity::fixtures::{Widget, WidgetEvent};
    use crate::publisher::tests::RecordingHandler;
    use crate::{InMemoryRepository, InProcessEventPublisher};

    #[tokio::test]
    async fn chain_audits_persists_and_publishes() {
        let store = InMemoryRepository::<Widget>::new();
        let recorder = Arc::new(RecordingHandler::default());
        let publisher =
            InProcessEventPublisher::<WidgetEvent>::new().with_handler(recorder.clone());
        let repo: SharedRepository<Widget> = decorate(store.clone(), publisher, "tester");
        let cancel = CancellationToken::new();

        let mut widget = repo.insert(Widget::new("gear"), &cancel).await.unwrap();
        assert_eq!(widget.audit.created_by.as_deref(), Some("tester"));
        assert!(widget.events.is_empty());

        widget.rename("cog");
        repo.update(widget, &cancel).await.unwrap();

        let seen = recorder.seen.lock().await;
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], WidgetEvent::Created(_)));
        assert!(matches!(seen[1], WidgetEvent::Renamed(_)));
        assert_eq!(store.len().await, 1);
    }
}
