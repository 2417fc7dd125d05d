use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{Entity, FindOptions, Repository, Result};

/// Outermost decorator: logs and measures every repository operation.
pub struct LoggingRepository<R> {
    inner: R,
}

impl<R> LoggingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

async fn observe<T, F>(
    entity: &'static str,
    operation: &'static str,
    id: Option<String>,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let id = id.unwrap_or_default();
    tracing::debug!(entity, operation, %id, "repository operation started");
    let started = Instant::now();

    let result = call.await;

    let elapsed = started.elapsed();
    let outcome = match &result {
        Ok(_) => {
            tracing::info!(
                entity,
                operation,
                %id,
                elapsed_ms = elapsed.as_millis() as u64,
                "repository operation finished"
            );
            "ok"
        }
        Err(err) => {
            tracing::warn!(
                entity,
                operation,
                %id,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %err,
                "repository operation failed"
            );
            err.kind()
        }
    };

    metrics::counter!(
        "repository_operations_total",
        "entity" => entity,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "repository_operation_duration_seconds",
        "entity" => entity,
        "operation" => operation
    )
    .record(elapsed.as_secs_f64());

    result
}

#[async_trait]
impl<E, R> Repository<E> for LoggingRepository<R>
where
    E: Entity,
    R: Repository<E>,
{
    async fn insert(&self, entity: E, cancel: &CancellationToken) -> Result<E> {
        let id = entity.id().to_string();
        observe(
            E::entity_type(),
            "insert",
            Some(id),
            self.inner.insert(entity, cancel),
        )
        .await
    }

    async fn update(&self, entity: E, cancel: &CancellationToken) -> Result<E> {
        let id = entity.id().to_string();
        observe(
            E::entity_type(),
            "update",
            Some(id),
            self.inner.update(entity, cancel),
        )
        .await
    }

    async fn delete(&self, entity: E, cancel: &CancellationToken) -> Result<()> {
        let id = entity.id().to_string();
        observe(
            E::entity_type(),
            "delete",
            Some(id),
            self.inner.delete(entity, cancel),
        )
        .await
    }

    async fn find_one(&self, id: E::Id, cancel: &CancellationToken) -> Result<Option<E>> {
        observe(
            E::entity_type(),
            "find_one",
            Some(id.to_string()),
            self.inner.find_one(id, cancel),
        )
        .await
    }

    async fn find_all(
        &self,
        options: FindOptions<E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        observe(
            E::entity_type(),
            "find_all",
            None,
            self.inner.find_all(options, cancel),
        )
        .await
    }
}
