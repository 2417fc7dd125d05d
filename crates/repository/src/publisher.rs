//! In-process publication of domain events to registered handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{DomainEvent, RepositoryError, Result};

/// Reacts to a committed domain event.
#[async_trait]
pub trait EventHandler<Ev: DomainEvent>: Send + Sync {
    /// Returns the name of this handler.
    fn name(&self) -> &'static str;

    /// Handles a single event.
    ///
    /// An error is reported to the caller of the write that produced the
    /// event; the write itself has already been committed.
    async fn handle(&self, event: &Ev) -> std::result::Result<(), String>;
}

/// Delivers domain events after the write that registered them.
#[async_trait]
pub trait EventPublisher<Ev: DomainEvent>: Send + Sync {
    async fn publish(&self, event: &Ev, cancel: &CancellationToken) -> Result<()>;
}

#[async_trait]
impl<Ev, P> EventPublisher<Ev> for Arc<P>
where
    Ev: DomainEvent,
    P: EventPublisher<Ev> + ?Sized,
{
    async fn publish(&self, event: &Ev, cancel: &CancellationToken) -> Result<()> {
        (**self).publish(event, cancel).await
    }
}

/// Publishes events to handlers in registration order, in-process.
///
/// Delivery stops at the first failing handler.
pub struct InProcessEventPublisher<Ev: DomainEvent> {
    handlers: Vec<Arc<dyn EventHandler<Ev>>>,
}

impl<Ev: DomainEvent> InProcessEventPublisher<Ev> {
    /// Creates a publisher with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registers a handler with this publisher.
    pub fn register(&mut self, handler: Arc<dyn EventHandler<Ev>>) {
        self.handlers.push(handler);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler<Ev>>) -> Self {
        self.register(handler);
        self
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<Ev: DomainEvent> Default for InProcessEventPublisher<Ev> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Ev: DomainEvent> EventPublisher<Ev> for InProcessEventPublisher<Ev> {
    #[tracing::instrument(skip(self, event, cancel), fields(event_type = event.event_type()))]
    async fn publish(&self, event: &Ev, cancel: &CancellationToken) -> Result<()> {
        for handler in &self.handlers {
            if cancel.is_cancelled() {
                return Err(RepositoryError::Cancelled);
            }

            handler
                .handle(event)
                .await
                .map_err(|message| RepositoryError::Publish {
                    handler: handler.name(),
                    message,
                })?;
            metrics::counter!("domain_events_handled_total", "event_type" => event.event_type())
                .increment(1);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entity::fixtures::{WidgetEvent, WidgetId};
    use tokio::sync::Mutex;

    /// Records every event it sees.
    #[derive(Default)]
    pub(crate) struct RecordingHandler {
        pub seen: Mutex<Vec<WidgetEvent>>,
    }

    #[async_trait]
    impl EventHandler<WidgetEvent> for RecordingHandler {
        fn name(&self) -> &'static str {
            "RecordingHandler"
        }

        async fn handle(&self, event: &WidgetEvent) -> std::result::Result<(), String> {
            self.seen.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler<WidgetEvent> for FailingHandler {
        fn name(&self) -> &'static str {
            "FailingHandler"
        }

        async fn handle(&self, _event: &WidgetEvent) -> std::result::Result<(), String> {
            Err("boom".to_string())
        }
    }

    #[tokio::test]
    async fn publishes_to_all_handlers() {
        let first = Arc::new(RecordingHandler::default());
        let second = Arc::new(RecordingHandler::default());
        let publisher = InProcessEventPublisher::<WidgetEvent>::new()
            .with_handler(first.clone())
            .with_handler(second.clone());
        assert_eq!(publisher.handler_count(), 2);

        let event = WidgetEvent::Created(WidgetId::new());
        publisher
            .publish(&event, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first.seen.lock().await.as_slice(), &[event.clone()]);
        assert_eq!(second.seen.lock().await.as_slice(), &[event]);
    }

    #[tokio::test]
    async fn failing_handler_stops_delivery() {
        let after = Arc::new(RecordingHandler::default());
        let publisher = InProcessEventPublisher::<WidgetEvent>::new()
            .with_handler(Arc::new(FailingHandler))
            .with_handler(after.clone());

        let result = publisher
            .publish(&WidgetEvent::Created(WidgetId::new()), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::Publish {
                handler: "FailingHandler",
                ..
            })
        ));
        assert!(after.seen.lock().await.is_empty());
    }
}
