use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::{Entity, FindOptions, Repository, Result};

/// Stamps audit metadata on aggregates before they are written.
///
/// Inserts record `created_by`/`created_at`, updates record
/// `updated_by`/`updated_at`. Reads and deletes pass straight through.
pub struct AuditRepository<R> {
    inner: R,
    user: String,
}

impl<R> AuditRepository<R> {
    /// Wraps `inner`, attributing every write to `user`.
    pub fn new(inner: R, user: impl Into<String>) -> Self {
        Self {
            inner,
            user: user.into(),
        }
    }

    /// Returns the name writes are attributed to.
    pub fn user(&self) -> &str {
        &self.user
    }
}

#[async_trait]
impl<E, R> Repository<E> for AuditRepository<R>
where
    E: Entity,
    R: Repository<E>,
{
    async fn insert(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        entity
            .audit_state_mut()
            .set_created(self.user.as_str(), Utc::now());
        self.inner.insert(entity, cancel).await
    }

    async fn update(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        entity
            .audit_state_mut()
            .set_updated(self.user.as_str(), Utc::now());
        self.inner.update(entity, cancel).await
    }

    async fn delete(&self, entity: E, cancel: &CancellationToken) -> Result<()> {
        self.inner.delete(entity, cancel).await
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
