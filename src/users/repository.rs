// Database repositories for users

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::db::StoreError;
use crate::query::{UserQueryBuilder, ValidatedUserQuery};
use crate::users::models::{NewUser, User, UserChanges};

/// Storage contract for user records
///
/// Email uniqueness is case-insensitive and enforced by the store
/// (`StoreError::UniqueViolation`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replace the mutable fields of a user. `None` if the user does not exist.
    async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// One page of users matching the query, plus the total match count
    async fn list(&self, query: &ValidatedUserQuery) -> Result<(Vec<User>, i64), StoreError>;
}

/// User repository for database operations
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, role, tenant_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            User::COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", User::COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", User::COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users
             SET first_name = $1, last_name = $2, email = $3, role = $4, tenant_id = $5, updated_at = NOW()
             WHERE id = $6
             RETURNING {}",
            User::COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.email)
            .bind(changes.role)
            .bind(changes.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &ValidatedUserQuery) -> Result<(Vec<User>, i64), StoreError> {
        let builder = UserQueryBuilder::from_query(query);

        let (page_sql, params) = builder.build();
        let mut page_query = sqlx::query_as::<_, User>(&page_sql);
        for param in params {
            page_query = page_query.bind(param);
        }
        let users = page_query.fetch_all(&self.pool).await?;

        let (count_sql, params) = builder.build_count();
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in params {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((users, total))
    }
}

/// In-process user store
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<InMemoryUsers>,
}

#[derive(Default)]
struct InMemoryUsers {
    next_id: i32,
    users: HashMap<i32, User>,
}

impl InMemoryUsers {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

impl InMemoryUserStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

fn matches_query(user: &User, query: &ValidatedUserQuery) -> bool {
    let search_ok = query.q.as_ref().map_or(true, |q| {
        let q = q.to_lowercase();
        format!("{} {}", user.first_name, user.last_name)
            .to_lowercase()
            .contains(&q)
            || user.email.to_lowercase().contains(&q)
    });
    let role_ok = query.role.map_or(true, |role| user.role == role);
    search_ok && role_ok
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, None) {
            return Err(StoreError::UniqueViolation("users_email_unique".to_string()));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            tenant_id: user.tenant_id,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&changes.email, Some(id)) {
            return Err(StoreError::UniqueViolation("users_email_unique".to_string()));
        }

        Ok(inner.users.get_mut(&id).map(|user| {
            user.first_name = changes.first_name;
            user.last_name = changes.last_name;
            user.email = changes.email;
            user.role = changes.role;
            user.tenant_id = changes.tenant_id;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn list(&self, query: &ValidatedUserQuery) -> Result<(Vec<User>, i64), StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&User> = inner.users.values().filter(|u| matches_query(u, query)).collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset())
            .take(query.per_page as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }
}
