// HTTP handlers for tenant administration
// Mutations are ADMIN only; reads are ADMIN or MANAGER (enforced at the router)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::models::IdResponse;
use crate::error::ApiError;
use crate::tenants::models::{Tenant, TenantRequest};
use crate::validation::parse_path_id;
use crate::AppState;

/// Handler for POST /tenants
#[utoipa::path(
    post,
    path = "/tenants",
    request_body = TenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = IdResponse),
        (status = 400, description = "Invalid input", body = String),
        (status = 403, description = "Caller is not an admin", body = String)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(payload): Json<TenantRequest>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let tenant = state.tenant_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: tenant.id })))
}

/// Handler for GET /tenants
#[utoipa::path(
    get,
    path = "/tenants",
    responses(
        (status = 200, description = "All tenants", body = Vec<Tenant>),
        (status = 403, description = "Caller is neither admin nor manager", body = String)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(State(state): State<AppState>) -> Result<Json<Vec<Tenant>>, ApiError> {
    Ok(Json(state.tenant_service.list().await?))
}

/// Handler for GET /tenants/:id
#[utoipa::path(
    get,
    path = "/tenants/{id}",
    params(("id" = i32, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant found", body = Tenant),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "Tenant not found", body = String)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Tenant>, ApiError> {
    let id = parse_path_id(&raw_id)?;
    Ok(Json(state.tenant_service.get(id).await?))
}

/// Handler for PATCH /tenants/:id
#[utoipa::path(
    patch,
    path = "/tenants/{id}",
    params(("id" = i32, Path, description = "Tenant ID")),
    request_body = TenantRequest,
    responses(
        (status = 200, description = "Tenant updated", body = IdResponse),
        (status = 400, description = "Malformed id or invalid input", body = String),
        (status = 404, description = "Tenant not found", body = String)
    ),
    tag = "tenants"
)]
pub async fn update_tenant(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(payload): Json<TenantRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = parse_path_id(&raw_id)?;
    let tenant = state.tenant_service.update(id, payload).await?;
    Ok(Json(IdResponse { id: tenant.id }))
}

/// Handler for DELETE /tenants/:id
#[utoipa::path(
    delete,
    path = "/tenants/{id}",
    params(("id" = i32, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant deleted", body = IdResponse),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "Tenant not found", body = String)
    ),
    tag = "tenants"
)]
pub async fn delete_tenant(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = parse_path_id(&raw_id)?;
    state.tenant_service.delete(id).await?;
    Ok(Json(IdResponse { id }))
}
