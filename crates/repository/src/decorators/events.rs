use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{DomainEvent, Entity, EventPublisher, FindOptions, Repository, RepositoryError, Result};

/// Publishes an aggregate's pending events once its write has committed.
///
/// Events are drained from the aggregate before delegating. If the inner
/// write fails the events are discarded unpublished. After a successful
/// write every event is published, in registration order; cancellation is
/// no longer observed at that point since the write is already visible.
///
/// The write and its publication run as one spawned task, so dropping the
/// caller's future (a timeout, a disconnected client) cannot separate a
/// committed write from its events.
pub struct EventPublishingRepository<R, P> {
    inner: Arc<R>,
    publisher: Arc<P>,
}

impl<R, P> EventPublishingRepository<R, P> {
    pub fn new(inner: R, publisher: P) -> Self {
        Self {
            inner: Arc::new(inner),
            publisher: Arc::new(publisher),
        }
    }

    /// Owned handles for a spawned write.
    fn detach(&self, cancel: &CancellationToken) -> (Arc<R>, Arc<P>, CancellationToken) {
        (
            Arc::clone(&self.inner),
            Arc::clone(&self.publisher),
            cancel.clone(),
        )
    }
}

async fn publish_all<Ev, P>(publisher: &P, events: Vec<Ev>) -> Result<()>
where
    Ev: DomainEvent,
    P: EventPublisher<Ev> + ?Sized,
{
    let committed = CancellationToken::new();
    for event in &events {
        tracing::debug!(event_type = event.event_type(), "publishing domain event");
        publisher.publish(event, &committed).await?;
    }
    Ok(())
}

/// Runs a write and the publication of its events to completion, even if
/// the caller stops waiting.
async fn detached<T, F>(write: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    match tokio::spawn(write).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => Err(RepositoryError::Cancelled),
    }
}

#[async_trait]
impl<E, R, P> Repository<E> for EventPublishingRepository<R, P>
where
    E: Entity,
    R: Repository<E> + 'static,
    P: EventPublisher<E::Event> + 'static,
{
    async fn insert(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        let (inner, publisher, cancel) = self.detach(cancel);
        detached(async move {
            let events = entity.take_events();
            let stored = inner.insert(entity, &cancel).await?;
            publish_all(&*publisher, events).await?;
            Ok(stored)
        })
        .await
    }

    async fn update(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        let (inner, publisher, cancel) = self.detach(cancel);
        detached(async move {
            let events = entity.take_events();
            let stored = inner.update(entity, &cancel).await?;
            publish_all(&*publisher, events).await?;
            Ok(stored)
        })
        .await
    }

    async fn delete(&self, mut entity: E, cancel: &CancellationToken) -> Result<()> {
        let (inner, publisher, cancel) = self.detach(cancel);
        detached(async move {
            let events = entity.take_events();
            inner.delete(entity, &cancel).await?;
            publish_all(&*publisher, events).await
        })
        .await
    }

    async fn find_one(&self, id: E::Id, cancel: &CancellationToken) -> Result<Option<E>> {
        self.inner.find_one(id, cancel).await
    }

    async fn find_all(
        &self,
        options: FindOptions<E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        self.inner.find_all(options, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::EventHandler;
    use crate::decorators::recorder::{RecordingRepository, SequenceHandler};
    use crate::entity::fixtures::{Widget, WidgetEvent};
    use crate::publisher::InProcessEventPublisher;

    fn publisher_for(store: &RecordingRepository) -> InProcessEventPublisher<WidgetEvent> {
        InProcessEventPublisher::<WidgetEvent>::new()
            .with_handler(Arc::new(SequenceHandler::new(store.log())))
    }

    #[tokio::test]
    async fn events_are_published_after_the_write() {
        let store = RecordingRepository::new();
        let repo = EventPublishingRepository::new(store.clone(), publisher_for(&store));

        let stored = repo
            .insert(Widget::new("gear"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(stored.events.is_empty());
        assert_eq!(
            store.sequence().await,
            vec!["write:insert".to_string(), "publish:WidgetCreated".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_write_publishes_nothing() {
        let store = RecordingRepository::failing();
        let repo = EventPublishingRepository::new(store.clone(), publisher_for(&store));

        let mut widget = Widget::new("gear");
        widget.rename("cog");
        let result = repo.update(widget, &CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(RepositoryError::ConcurrencyConflict { .. })
        ));
        assert_eq!(store.sequence().await, vec!["write:update".to_string()]);
    }

    /// Appends to the store log after a delay.
    struct SlowHandler {
        inner: SequenceHandler,
        delay: Duration,
    }

    #[async_trait]
    impl EventHandler<WidgetEvent> for SlowHandler {
        fn name(&self) -> &'static str {
            "SlowHandler"
        }

        async fn handle(&self, event: &WidgetEvent) -> std::result::Result<(), String> {
            tokio::time::sleep(self.delay).await;
            self.inner.handle(event).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_caller_does_not_lose_committed_events() {
        let store = RecordingRepository::new();
        let publisher = InProcessEventPublisher::<WidgetEvent>::new().with_handler(Arc::new(
            SlowHandler {
                inner: SequenceHandler::new(store.log()),
                delay: Duration::from_millis(300),
            },
        ));
        let repo = EventPublishingRepository::new(store.clone(), publisher);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            repo.insert(Widget::new("gear"), &CancellationToken::new()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.written().await.len(), 1);
        assert_eq!(
            store.sequence().await,
            vec!["write:insert".to_string(), "publish:WidgetCreated".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_publishes_registered_events() {
        let store = RecordingRepository::new();
        let repo = EventPublishingRepository::new(store.clone(), publisher_for(&store));

        let mut widget = Widget::new("gear");
        widget.take_events();
        widget.rename("retired");
        repo.delete(widget, &CancellationToken::new()).await.unwrap();

        assert_eq!(
            store.sequence().await,
            vec!["write:delete".to_string(), "publish:WidgetRenamed".to_string()]
        );
    }
}
