use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{Entity, FindOptions, RepositoryError, Result};

/// Core trait for aggregate repositories.
///
/// Implementations are either a concrete store (in-memory, PostgreSQL) or a
/// decorator wrapping another repository. Every operation observes the
/// cancellation token; a cancelled operation returns
/// [`RepositoryError::Cancelled`] and leaves the store untouched. A write
/// the store has already started is not abandoned.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Persists a new aggregate.
    ///
    /// Returns the stored aggregate carrying its freshly issued concurrency
    /// token. Fails with `AlreadyExists` if the id is taken and with
    /// `UniqueViolation` if one of its unique keys is.
    async fn insert(&self, entity: E, cancel: &CancellationToken) -> Result<E>;

    /// Persists changes to an existing aggregate.
    ///
    /// The aggregate's concurrency token must equal the stored token, else
    /// the write fails with `ConcurrencyConflict`. Fails with `NotFound` if
    /// the row is gone.
    async fn update(&self, entity: E, cancel: &CancellationToken) -> Result<E>;

    /// Removes an aggregate. Fails with `NotFound` if the row is gone.
    async fn delete(&self, entity: E, cancel: &CancellationToken) -> Result<()>;

    /// Loads an aggregate by id, returning None if it doesn't exist.
    async fn find_one(&self, id: E::Id, cancel: &CancellationToken) -> Result<Option<E>>;

    /// Loads all aggregates matching the options.
    async fn find_all(&self, options: FindOptions<E>, cancel: &CancellationToken)
    -> Result<Vec<E>>;
}

/// A type-erased repository, as composed by [`decorate`](crate::decorate).
pub type SharedRepository<E> = Arc<dyn Repository<E>>;

#[async_trait]
impl<E, R> Repository<E> for Arc<R>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    async fn insert(&self, entity: E, cancel: &CancellationToken) -> Result<E> {
        (**self).insert(entity, cancel).await
    }

    async fn update(&self, entity: E, cancel: &CancellationToken) -> Result<E> {
        (**self).update(entity, cancel).await
    }

    async fn delete(&self, entity: E, cancel: &CancellationToken) -> Result<()> {
        (**self).delete(entity, cancel).await
    }

    async fn find_one(&self, id: E::Id, cancel: &CancellationToken) -> Result<Option<E>> {
        (**self).find_one(id, cancel).await
    }

    async fn find_all(
        &self,
        options: FindOptions<E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        (**self).find_all(options, cancel).await
    }
}

/// Extension trait providing Result-returning convenience lookups.
#[async_trait]
pub trait RepositoryExt<E: Entity>: Repository<E> {
    /// Loads an aggregate, failing with `NotFound` if it doesn't exist.
    async fn find_one_required(&self, id: E::Id, cancel: &CancellationToken) -> Result<E> {
        self.find_one(id, cancel)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: E::entity_type(),
                id: id.to_string(),
            })
    }

    /// Checks if an aggregate exists.
    async fn exists(&self, id: E::Id, cancel: &CancellationToken) -> Result<bool> {
        Ok(self.find_one(id, cancel).await?.is_some())
    }

    /// Counts the aggregates matching the options.
    async fn count(&self, options: FindOptions<E>, cancel: &CancellationToken) -> Result<usize> {
        Ok(self.find_all(options, cancel).await?.len())
    }
}

// Blanket implementation for all repositories
impl<E: Entity, T: Repository<E> + ?Sized> RepositoryExt<E> for T {}

/// Runs a read unless the token fires first.
///
/// Only reads may be abandoned midway; dropping one has no effect on the
/// store.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(RepositoryError::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RepositoryError::Cancelled),
        result = operation => result,
    }
}

/// Starts a write unless the token has already fired.
///
/// A started write is never raced against the token: the statement may
/// already be applied server-side, so the outcome reported is always the
/// real one. Transactional writes check the token again before committing.
pub(crate) async fn before_write<T, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(RepositoryError::Cancelled);
    }
    operation.await
}
