use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    ConcurrencyToken, Entity, FindOptions, RepositoryError, Result, repository::Repository,
};

/// In-memory repository implementation for testing and local runs.
///
/// Rows are kept in insertion order. Writes take the lock, compare the
/// concurrency token, check unique keys and swap the row in one step, which
/// gives the same conflict semantics as the PostgreSQL implementation.
#[derive(Clone)]
pub struct InMemoryRepository<E> {
    rows: Arc<RwLock<Vec<E>>>,
}

impl<E: Entity> InMemoryRepository<E> {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns the number of stored aggregates.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Removes all aggregates.
    pub async fn clear(&self) {
        self.rows.write().await.clear();
    }

    fn not_found(id: E::Id) -> RepositoryError {
        RepositoryError::NotFound {
            entity: E::entity_type(),
            id: id.to_string(),
        }
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of the aggregate as it goes into storage: no pending events.
fn stored_copy<E: Entity>(entity: &E) -> E {
    let mut row = entity.clone();
    row.take_events();
    row
}

/// A unique key of `entity` that another row already holds.
fn duplicate_key<E: Entity>(rows: &[E], entity: &E) -> Option<RepositoryError> {
    let id = entity.id();
    let keys = entity.unique_keys();
    rows.iter()
        .filter(|row| row.id() != id)
        .find_map(|row| {
            let held = row.unique_keys();
            keys.iter().find(|key| held.contains(*key)).cloned()
        })
        .map(|(key, value)| RepositoryError::UniqueViolation {
            entity: E::entity_type(),
            key,
            value,
        })
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn insert(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        let mut rows = self.rows.write().await;
        if cancel.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }

        let id = entity.id();
        if rows.iter().any(|row| row.id() == id) {
            return Err(RepositoryError::AlreadyExists {
                entity: E::entity_type(),
                id: id.to_string(),
            });
        }
        if let Some(err) = duplicate_key(&rows, &entity) {
            return Err(err);
        }

        entity.set_concurrency_token(ConcurrencyToken::issue());
        rows.push(stored_copy(&entity));
        Ok(entity)
    }

    async fn update(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        let mut rows = self.rows.write().await;
        if cancel.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }

        let id = entity.id();
        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let actual = rows[index].concurrency_token();
        let expected = entity.concurrency_token();
        if actual != expected {
            return Err(RepositoryError::ConcurrencyConflict {
                entity: E::entity_type(),
                id: id.to_string(),
                expected,
                actual,
            });
        }
        if let Some(err) = duplicate_key(&rows, &entity) {
            return Err(err);
        }

        entity.set_concurrency_token(ConcurrencyToken::issue());
        rows[index] = stored_copy(&entity);
        Ok(entity)
    }

    async fn delete(&self, entity: E, cancel: &CancellationToken) -> Result<()> {
        let mut rows = self.rows.write().await;
        if cancel.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }

        let id = entity.id();
        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        rows.remove(index);
        Ok(())
    }

    async fn find_one(&self, id: E::Id, cancel: &CancellationToken) -> Result<Option<E>> {
        if cancel.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }

        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn find_all(
        &self,
        options: FindOptions<E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        if cancel.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }

        let rows = self.rows.read().await;
        Ok(options.apply(rows.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::{Widget, WidgetId};

    #[tokio::test]
    async fn insert_issues_token_and_strips_events() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let widget = Widget::new("gear");
        assert!(widget.token.is_unset());

        let stored = repo.insert(widget, &cancel).await.unwrap();
        assert!(!stored.token.is_unset());
        assert_eq!(stored.events.len(), 1);

        let loaded = repo.find_one(stored.id, &cancel).await.unwrap().unwrap();
        assert_eq!(loaded.token, stored.token);
        assert!(loaded.events.is_empty());
    }

    #[tokio::test]
    async fn insert_duplicate_id_fails() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let stored = repo.insert(Widget::new("gear"), &cancel).await.unwrap();

        let result = repo.insert(stored, &cancel).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_with_current_token_succeeds() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let mut widget = repo.insert(Widget::new("gear"), &cancel).await.unwrap();
        let first_token = widget.token;

        widget.rename("cog");
        let updated = repo.update(widget, &cancel).await.unwrap();
        assert_ne!(updated.token, first_token);

        let loaded = repo.find_one(updated.id, &cancel).await.unwrap().unwrap();
        assert_eq!(loaded.name, "cog");
    }

    #[tokio::test]
    async fn update_with_stale_token_conflicts() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let stored = repo.insert(Widget::new("gear"), &cancel).await.unwrap();

        let mut first = stored.clone();
        let mut second = stored;
        first.rename("cog");
        second.rename("sprocket");

        repo.update(first, &cancel).await.unwrap();
        let result = repo.update(second.clone(), &cancel).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConcurrencyConflict { .. })
        ));

        let loaded = repo.find_one(second.id, &cancel).await.unwrap().unwrap();
        assert_eq!(loaded.name, "cog");
    }

    #[tokio::test]
    async fn unique_keys_are_enforced_on_insert_and_update() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        repo.insert(Widget::new("gear"), &cancel).await.unwrap();
        let mut cog = repo.insert(Widget::new("cog"), &cancel).await.unwrap();

        let result = repo.insert(Widget::new("gear"), &cancel).await;
        assert!(matches!(
            result,
            Err(RepositoryError::UniqueViolation { key: "name", ref value, .. }) if value == "gear"
        ));

        cog.rename("gear");
        let result = repo.update(cog.clone(), &cancel).await;
        assert!(matches!(result, Err(RepositoryError::UniqueViolation { .. })));

        cog.rename("cog");
        repo.update(cog, &cancel).await.unwrap();
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_key_admit_one() {
        let repo = InMemoryRepository::new();
        let mut handles = Vec::new();
        for _ in 0..5 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(Widget::new("gear"), &CancellationToken::new())
                    .await
            }));
        }

        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => stored += 1,
                Err(RepositoryError::UniqueViolation { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();

        let result = repo.update(Widget::new("ghost"), &cancel).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_removes_row_once() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        let stored = repo.insert(Widget::new("gear"), &cancel).await.unwrap();

        repo.delete(stored.clone(), &cancel).await.unwrap();
        assert!(repo.is_empty().await);

        let result = repo.delete(stored, &cancel).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn cancelled_write_is_not_applied() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = repo.insert(Widget::new("gear"), &cancel).await;
        assert!(matches!(result, Err(RepositoryError::Cancelled)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn find_all_applies_options() {
        let repo = InMemoryRepository::new();
        let cancel = CancellationToken::new();
        for name in ["delta", "alpha", "charlie", "bravo"] {
            repo.insert(Widget::new(name), &cancel).await.unwrap();
        }

        let options = FindOptions::new()
            .filter(|w: &Widget| w.name != "delta")
            .order_by_key(|w: &Widget| w.name.clone())
            .take(2);
        let names: Vec<_> = repo
            .find_all(options, &cancel)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["alpha", "bravo"]);
    }

    #[tokio::test]
    async fn find_one_missing_returns_none() {
        let repo = InMemoryRepository::<Widget>::new();
        let cancel = CancellationToken::new();
        assert!(repo.find_one(WidgetId::new(), &cancel).await.unwrap().is_none());
    }
}
