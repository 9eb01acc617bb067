// HTTP handlers for user administration (ADMIN only, enforced at the router)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::auth::models::IdResponse;
use crate::error::ApiError;
use crate::query::{UserQueryParams, UserQueryValidator};
use crate::users::models::{CreateUserRequest, UpdateUserRequest, UserPage, UserResponse};
use crate::validation::parse_path_id;
use crate::AppState;

/// Handler for POST /users
/// Creates a user with an explicit role
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = IdResponse),
        (status = 400, description = "Invalid input, duplicate email or unknown tenant", body = String),
        (status = 401, description = "Missing or invalid access token", body = String),
        (status = 403, description = "Caller is not an admin", body = String)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let user = state.user_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id: user.id })))
}

/// Handler for GET /users
/// Lists users with search, role filter and pagination
#[utoipa::path(
    get,
    path = "/users",
    params(UserQueryParams),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 400, description = "Invalid query parameters", body = String)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<UserPage>, ApiError> {
    tracing::debug!("Listing users with query parameters: {:?}", params);

    let validated = UserQueryValidator::validate(params).map_err(|e| ApiError::BadRequest(e.message))?;
    let page = state.user_service.list(validated).await?;
    Ok(Json(page))
}

/// Handler for GET /users/:id
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_path_id(&raw_id)?;
    let user = state.user_service.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Handler for PATCH /users/:id
/// Replaces names, email, role and tenant
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = IdResponse),
        (status = 400, description = "Malformed id, invalid input, duplicate email or unknown tenant", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = parse_path_id(&raw_id)?;
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(IdResponse { id: user.id }))
}

/// Handler for DELETE /users/:id
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = IdResponse),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = parse_path_id(&raw_id)?;
    state.user_service.delete(id).await?;
    Ok(Json(IdResponse { id }))
}
