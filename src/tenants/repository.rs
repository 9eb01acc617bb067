// Database repositories for tenants

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::db::StoreError;
use crate::tenants::models::{Tenant, TenantRequest};

/// Storage contract for tenant records
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn create(&self, request: TenantRequest) -> Result<Tenant, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Tenant>, StoreError>;

    /// All tenants ordered by id
    async fn list(&self) -> Result<Vec<Tenant>, StoreError>;

    /// `None` if the tenant does not exist
    async fn update(&self, id: i32, request: TenantRequest) -> Result<Option<Tenant>, StoreError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}

/// Tenant repository for database operations
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    /// Create a new TenantRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for TenantRepository {
    async fn create(&self, request: TenantRequest) -> Result<Tenant, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, address) VALUES ($1, $2)
             RETURNING id, name, address, created_at, updated_at",
        )
        .bind(&request.name)
        .bind(&request.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Tenant>, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, address, created_at, updated_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn list(&self) -> Result<Vec<Tenant>, StoreError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, address, created_at, updated_at FROM tenants ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn update(&self, id: i32, request: TenantRequest) -> Result<Option<Tenant>, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET name = $1, address = $2, updated_at = NOW() WHERE id = $3
             RETURNING id, name, address, created_at, updated_at",
        )
        .bind(&request.name)
        .bind(&request.address)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-process tenant store
#[derive(Default)]
pub struct InMemoryTenantStore {
    inner: RwLock<InMemoryTenants>,
}

#[derive(Default)]
struct InMemoryTenants {
    next_id: i32,
    tenants: BTreeMap<i32, Tenant>,
}

impl InMemoryTenantStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn create(&self, request: TenantRequest) -> Result<Tenant, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let tenant = Tenant {
            id: inner.next_id,
            name: request.name,
            address: request.address,
            created_at: now,
            updated_at: now,
        };
        inner.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Tenant>, StoreError> {
        Ok(self.inner.read().await.tenants.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>, StoreError> {
        Ok(self.inner.read().await.tenants.values().cloned().collect())
    }

    async fn update(&self, id: i32, request: TenantRequest) -> Result<Option<Tenant>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.tenants.get_mut(&id).map(|tenant| {
            tenant.name = request.name;
            tenant.address = request.address;
            tenant.updated_at = Utc::now();
            tenant.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.tenants.remove(&id).is_some())
    }
}
