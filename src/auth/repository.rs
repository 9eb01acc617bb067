// Refresh token persistence
//
// One row per outstanding refresh token. Deleting a row is the only way a
// refresh token stops validating before it expires.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::auth::models::RefreshTokenRecord;
use crate::db::StoreError;

/// Storage contract for refresh token records
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a record for `user_id`, returning it with its generated id
    async fn insert(&self, user_id: i32, expires_at: DateTime<Utc>) -> Result<RefreshTokenRecord, StoreError>;

    /// Look up a record by id
    async fn find(&self, id: i32) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Delete a record by id. Returns whether a row was removed.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// Delete `old_id` and insert a replacement for `user_id` as one unit
    ///
    /// Returns `None` when `old_id` no longer exists; nothing is inserted in that case.
    /// If the insert fails the delete is undone.
    async fn rotate(
        &self,
        old_id: i32,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Remove every record whose expiry has passed. Returns the number removed.
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}

/// Token repository for refresh token operations (PostgreSQL)
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Create a new TokenRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for TokenRepository {
    async fn insert(&self, user_id: i32, expires_at: DateTime<Utc>) -> Result<RefreshTokenRecord, StoreError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "INSERT INTO refresh_tokens (user_id, expires_at) VALUES ($1, $2)
             RETURNING id, user_id, expires_at, created_at",
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find(&self, id: i32) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT id, user_id, expires_at, created_at FROM refresh_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate(
        &self,
        old_id: i32,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The delete is the linearization point: a concurrent rotation of the
        // same id blocks on the row lock and then sees zero rows affected.
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            // Rolled back when tx is dropped
            return Ok(None);
        }

        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "INSERT INTO refresh_tokens (user_id, expires_at) VALUES ($1, $2)
             RETURNING id, user_id, expires_at, created_at",
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(record))
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// In-process refresh token store
///
/// Used by the test suite and for running the service without a database.
#[derive(Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<InMemoryTokens>,
}

#[derive(Default)]
struct InMemoryTokens {
    next_id: i32,
    records: HashMap<i32, RefreshTokenRecord>,
}

impl InMemoryTokens {
    fn insert(&mut self, user_id: i32, expires_at: DateTime<Utc>) -> RefreshTokenRecord {
        self.next_id += 1;
        let record = RefreshTokenRecord {
            id: self.next_id,
            user_id,
            expires_at,
            created_at: Utc::now(),
        };
        self.records.insert(record.id, record.clone());
        record
    }
}

impl InMemoryTokenStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Ids of the records held for `user_id`
    pub async fn ids_for_user(&self, user_id: i32) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .inner
            .read()
            .await
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryTokenStore {
    async fn insert(&self, user_id: i32, expires_at: DateTime<Utc>) -> Result<RefreshTokenRecord, StoreError> {
        Ok(self.inner.write().await.insert(user_id, expires_at))
    }

    async fn find(&self, id: i32) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.records.remove(&id).is_some())
    }

    async fn rotate(
        &self,
        old_id: i32,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        // Single write guard covers both steps
        let mut inner = self.inner.write().await;
        if inner.records.remove(&old_id).is_none() {
            return Ok(None);
        }
        Ok(Some(inner.insert(user_id, expires_at)))
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|_, record| !record.is_expired(now));
        Ok((before - inner.records.len()) as u64)
    }
}
