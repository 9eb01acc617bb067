pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{Tenant, TenantRequest};
pub use repository::{InMemoryTenantStore, TenantRepository, TenantStore};
pub use service::TenantService;
