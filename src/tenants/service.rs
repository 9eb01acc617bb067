use std::sync::Arc;

use tracing::{debug, info};
use validator::Validate;

use crate::error::ApiError;
use crate::tenants::models::{Tenant, TenantRequest};
use crate::tenants::repository::TenantStore;

/// Service layer for tenant administration
#[derive(Clone)]
pub struct TenantService {
    store: Arc<dyn TenantStore>,
}

impl TenantService {
    /// Create a new TenantService
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: TenantRequest) -> Result<Tenant, ApiError> {
        request.validate()?;
        debug!("Requesting for creating tenant: {}", request.name);

        let tenant = self.store.create(request).await?;
        info!("Tenant created successfully: id={}", tenant.id);
        Ok(tenant)
    }

    pub async fn list(&self) -> Result<Vec<Tenant>, ApiError> {
        let tenants = self.store.list().await?;
        debug!("Retrieved {} tenants", tenants.len());
        Ok(tenants)
    }

    pub async fn get(&self, id: i32) -> Result<Tenant, ApiError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant", id))
    }

    /// Whether a tenant with this id exists
    pub async fn exists(&self, id: i32) -> Result<bool, ApiError> {
        Ok(self.store.find_by_id(id).await?.is_some())
    }

    pub async fn update(&self, id: i32, request: TenantRequest) -> Result<Tenant, ApiError> {
        request.validate()?;

        let tenant = self
            .store
            .update(id, request)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant", id))?;

        info!("Tenant updated successfully: id={}", id);
        Ok(tenant)
    }

    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        if !self.store.delete(id).await? {
            return Err(ApiError::not_found("Tenant", id));
        }

        info!("Tenant deleted successfully: id={}", id);
        Ok(())
    }
}
