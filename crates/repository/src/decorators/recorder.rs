//! Test doubles for exercising decorators in isolation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::entity::fixtures::{Widget, WidgetEvent};
use crate::{
    ConcurrencyToken, DomainEvent, Entity, EventHandler, FindOptions, Repository, RepositoryError,
    Result,
};

type Log = Arc<Mutex<Vec<String>>>;

/// Innermost repository that records what reached it.
#[derive(Clone, Default)]
pub(crate) struct RecordingRepository {
    written: Arc<Mutex<Vec<Widget>>>,
    log: Log,
    fail: bool,
}

impl RecordingRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail with a concurrency conflict.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn log(&self) -> Log {
        self.log.clone()
    }

    pub(crate) async fn written(&self) -> Vec<Widget> {
        self.written.lock().unwrap().clone()
    }

    pub(crate) async fn sequence(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, operation: &str, widget: &Widget) -> Result<()> {
        self.log.lock().unwrap().push(format!("write:{operation}"));
        if self.fail {
            return Err(RepositoryError::ConcurrencyConflict {
                entity: Widget::entity_type(),
                id: widget.id.to_string(),
                expected: widget.token,
                actual: ConcurrencyToken::issue(),
            });
        }
        self.written.lock().unwrap().push(widget.clone());
        Ok(())
    }
}

#[async_trait]
impl Repository<Widget> for RecordingRepository {
    async fn insert(&self, entity: Widget, _cancel: &CancellationToken) -> Result<Widget> {
        self.record("insert", &entity)?;
        Ok(entity)
    }

    async fn update(&self, entity: Widget, _cancel: &CancellationToken) -> Result<Widget> {
        self.record("update", &entity)?;
        Ok(entity)
    }

    async fn delete(&self, entity: Widget, _cancel: &CancellationToken) -> Result<()> {
        self.record("delete", &entity)
    }

    async fn find_one(
        &self,
        id: <Widget as Entity>::Id,
        _cancel: &CancellationToken,
    ) -> Result<Option<Widget>> {
        Ok(self.written().await.into_iter().find(|w| w.id == id))
    }

    async fn find_all(
        &self,
        options: FindOptions<Widget>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Widget>> {
        Ok(options.apply(self.written().await))
    }
}

/// Event handler that appends to the store's log.
pub(crate) struct SequenceHandler {
    log: Log,
}

impl SequenceHandler {
    pub(crate) fn new(log: Log) -> Self {
        Self { log }
    }
}

#[async_trait]
impl EventHandler<WidgetEvent> for SequenceHandler {
    fn name(&self) -> &'static str {
        "SequenceHandler"
    }

    async fn handle(&self, event: &WidgetEvent) -> std::result::Result<(), String> {
        self.log
            .lock()
            .unwrap()
            .push(format!("publish:{}", event.event_type()));
        Ok(())
    }
}
