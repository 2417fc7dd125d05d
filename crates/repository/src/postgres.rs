use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    ConcurrencyToken, Entity, FindOptions, RepositoryError, Result,
    repository::{Repository, before_write, cancellable},
};

/// PostgreSQL-backed repository implementation.
///
/// Each aggregate is one row of the `aggregates` table, keyed by id and
/// discriminated by [`Entity::entity_type`]. The aggregate state is stored
/// as JSONB; the concurrency token is a real column so the update can
/// compare it in its `WHERE` clause. [`Entity::unique_keys`] are claimed in
/// the `aggregate_keys` table within the same transaction.
pub struct PostgresRepository<E> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> E>,
}

impl<E> Clone for PostgresRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<E: Entity> PostgresRepository<E> {
    /// Creates a new PostgreSQL repository.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_entity(row: PgRow) -> Result<E> {
        let payload: serde_json::Value = row.try_get("payload")?;
        let token: Uuid = row.try_get("concurrency_token")?;

        let mut entity: E = serde_json::from_value(payload)?;
        entity.set_concurrency_token(ConcurrencyToken::from_uuid(token));
        Ok(entity)
    }

    fn not_found(id: E::Id) -> RepositoryError {
        RepositoryError::NotFound {
            entity: E::entity_type(),
            id: id.to_string(),
        }
    }

    async fn insert_row(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        let id = entity.id();
        let token = ConcurrencyToken::issue();
        entity.set_concurrency_token(token);
        let payload = serde_json::to_value(&entity)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO aggregates (id, aggregate_type, concurrency_token, payload)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Into::<Uuid>::into(id))
        .bind(E::entity_type())
        .bind(token.as_uuid())
        .bind(&payload)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_violation_of(&e, "aggregates_pkey") {
                return RepositoryError::AlreadyExists {
                    entity: E::entity_type(),
                    id: id.to_string(),
                };
            }
            RepositoryError::Database(e)
        })?;

        Self::write_keys(&mut tx, &entity).await?;
        Self::commit_unless_cancelled(tx, cancel).await?;
        Ok(entity)
    }

    async fn update_row(&self, mut entity: E, cancel: &CancellationToken) -> Result<E> {
        let id = entity.id();
        let expected = entity.concurrency_token();
        let token = ConcurrencyToken::issue();
        entity.set_concurrency_token(token);
        let payload = serde_json::to_value(&entity)?;

        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(
            r#"
            UPDATE aggregates
            SET concurrency_token = $4, payload = $5, updated_at = NOW()
            WHERE id = $1 AND aggregate_type = $2 AND concurrency_token = $3
            "#,
        )
        .bind(Into::<Uuid>::into(id))
        .bind(E::entity_type())
        .bind(expected.as_uuid())
        .bind(token.as_uuid())
        .bind(&payload)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            // Nothing matched: either the row is gone or someone else wrote first.
            let current: Option<Uuid> = sqlx::query_scalar(
                "SELECT concurrency_token FROM aggregates WHERE id = $1 AND aggregate_type = $2",
            )
            .bind(Into::<Uuid>::into(id))
            .bind(E::entity_type())
            .fetch_optional(&mut *tx)
            .await?;

            return Err(match current {
                Some(actual) => RepositoryError::ConcurrencyConflict {
                    entity: E::entity_type(),
                    id: id.to_string(),
                    expected,
                    actual: ConcurrencyToken::from_uuid(actual),
                },
                None => Self::not_found(id),
            });
        }

        sqlx::query("DELETE FROM aggregate_keys WHERE aggregate_id = $1")
            .bind(Into::<Uuid>::into(id))
            .execute(&mut *tx)
            .await?;
        Self::write_keys(&mut tx, &entity).await?;

        Self::commit_unless_cancelled(tx, cancel).await?;
        Ok(entity)
    }

    /// Claims the aggregate's unique keys inside the write's transaction.
    ///
    /// The key table's primary key serializes concurrent claims: a second
    /// writer blocks until the first commits and then fails.
    async fn write_keys(tx: &mut Transaction<'_, Postgres>, entity: &E) -> Result<()> {
        for (key, value) in entity.unique_keys() {
            sqlx::query(
                r#"
                INSERT INTO aggregate_keys (aggregate_type, key_name, key_value, aggregate_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(E::entity_type())
            .bind(key)
            .bind(&value)
            .bind(Into::<Uuid>::into(entity.id()))
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_violation_of(&e, "aggregate_keys_pkey") {
                    return RepositoryError::UniqueViolation {
                        entity: E::entity_type(),
                        key,
                        value: value.clone(),
                    };
                }
                RepositoryError::Database(e)
            })?;
        }
        Ok(())
    }

    /// Last point at which a write may still be abandoned; dropping the
    /// transaction rolls it back.
    async fn commit_unless_cancelled(
        tx: Transaction<'_, Postgres>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }
        tx.commit().await?;
        Ok(())
    }

    /// Single statement; the key rows go with it by cascade.
    async fn delete_row(&self, id: E::Id) -> Result<()> {
        let affected = sqlx::query("DELETE FROM aggregates WHERE id = $1 AND aggregate_type = $2")
            .bind(Into::<Uuid>::into(id))
            .bind(E::entity_type())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn select_one(&self, id: E::Id) -> Result<Option<E>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT concurrency_token, payload
            FROM aggregates
            WHERE id = $1 AND aggregate_type = $2
            "#,
        )
        .bind(Into::<Uuid>::into(id))
        .bind(E::entity_type())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_entity).transpose()
    }

    /// Key lookups and plain paging run in SQL. Predicates and comparators
    /// are closures, so when present they are applied to the loaded rows.
    async fn select_all(&self, options: FindOptions<E>) -> Result<Vec<E>> {
        let mut sql = String::from("SELECT a.concurrency_token, a.payload FROM aggregates a");
        let mut param_count = 1;

        let key_lookup = options.key_lookup();
        if key_lookup.is_some() {
            sql.push_str(&format!(
                " JOIN aggregate_keys k ON k.aggregate_id = a.id AND k.aggregate_type = a.aggregate_type AND k.key_name = ${} AND k.key_value = ${}",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }

        sql.push_str(" WHERE a.aggregate_type = $1");

        let paged = options.pages_in_store_order();
        let direction = if paged && options.is_descending() {
            "DESC"
        } else {
            "ASC"
        };
        sql.push_str(&format!(
            " ORDER BY a.created_at {direction}, a.id {direction}"
        ));

        let (limit, offset) = if paged {
            (options.take_count(), options.skip_count())
        } else {
            (None, None)
        };
        if limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut query = sqlx::query(&sql).bind(E::entity_type());
        if let Some((key, value)) = key_lookup {
            query = query.bind(key).bind(value);
        }
        if let Some(limit) = limit {
            query = query.bind(limit as i64);
        }
        if let Some(offset) = offset {
            query = query.bind(offset as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let entities = rows
            .into_iter()
            .map(Self::row_to_entity)
            .collect::<Result<Vec<_>>>()?;

        if paged {
            Ok(entities)
        } else {
            Ok(options.apply(entities))
        }
    }
}

fn is_violation_of(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}

#[async_trait]
impl<E: Entity> Repository<E> for PostgresRepository<E> {
    async fn insert(&self, entity: E, cancel: &CancellationToken) -> Result<E> {
        before_write(cancel, self.insert_row(entity, cancel)).await
    }

    async fn update(&self, entity: E, cancel: &CancellationToken) -> Result<E> {
        before_write(cancel, self.update_row(entity, cancel)).await
    }

    async fn delete(&self, entity: E, cancel: &CancellationToken) -> Result<()> {
        before_write(cancel, self.delete_row(entity.id())).await
    }

    async fn find_one(&self, id: E::Id, cancel: &CancellationToken) -> Result<Option<E>> {
        cancellable(cancel, self.select_one(id)).await
    }

    async fn find_all(
        &self,
        options: FindOptions<E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        cancellable(cancel, self.select_all(options)).await
    }
}
