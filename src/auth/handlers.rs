// HTTP handlers for authentication endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use crate::auth::{
    cookies::REFRESH_TOKEN_COOKIE,
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{IdResponse, LoginRequest, RegisterRequest},
};
use crate::users::models::UserResponse;
use crate::AppState;

/// Register a new user
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered; session cookies set", body = IdResponse),
        (status = 400, description = "Invalid input or email already registered", body = String, example = json!({"error": "Email already exists"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Internal server error"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<IdResponse>), AuthError> {
    let session = state.auth_service.register(request).await?;

    let jar = state.cookies.issue(jar, session.access_token, session.refresh_token);
    Ok((StatusCode::CREATED, jar, Json(IdResponse { id: session.user.id })))
}

/// Login a user
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookies set", body = IdResponse),
        (status = 400, description = "Invalid input", body = String, example = json!({"error": "Validation error"})),
        (status = 401, description = "Invalid credentials", body = String, example = json!({"error": "Invalid email or password"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<IdResponse>), AuthError> {
    let session = state.auth_service.login(request).await?;

    let jar = state.cookies.issue(jar, session.access_token, session.refresh_token);
    Ok((jar, Json(IdResponse { id: session.user.id })))
}

/// Rotate the refresh token carried in the `refreshToken` cookie
/// POST /auth/refresh
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens rotated; session cookies replaced", body = IdResponse),
        (status = 400, description = "Token references a user that no longer exists", body = String, example = json!({"error": "User referenced by token does not exist"})),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token", body = String, example = json!({"error": "Token has been revoked"}))
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<IdResponse>), AuthError> {
    let refresh_token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let session = state.auth_service.refresh(&refresh_token).await?;

    let jar = state.cookies.issue(jar, session.access_token, session.refresh_token);
    Ok((jar, Json(IdResponse { id: session.user.id })))
}

/// Logout: revoke the refresh token (best-effort) and clear both cookies
/// POST /auth/logout
///
/// Cookies are cleared even when the access token is missing or expired; the
/// response is then 401 instead of 200.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out; session cookies cleared"),
        (status = 401, description = "Missing or invalid access token; session cookies cleared anyway", body = String, example = json!({"error": "Missing authentication token"}))
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    user: Result<AuthenticatedUser, AuthError>,
    jar: CookieJar,
) -> Response {
    let refresh_token = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    state.auth_service.logout(refresh_token.as_deref()).await;

    let jar = state.cookies.clear(jar);
    match user {
        Ok(user) => {
            info!("User has been logged out: id={}", user.user_id);
            (StatusCode::OK, jar).into_response()
        }
        Err(e) => (jar, e).into_response(),
    }
}

/// Get the authenticated user
/// GET /auth/self
#[utoipa::path(
    get,
    path = "/auth/self",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid access token", body = String, example = json!({"error": "Missing authentication token"}))
    ),
    tag = "auth"
)]
pub async fn self_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state.auth_service.current_user(user.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}
