// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::models::Role;
use crate::db::StoreError;

/// Authentication and authorization error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Authentication errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    /// Signature is fine but the backing refresh token row is gone (rotated or logged out)
    #[error("Token has been revoked")]
    RevokedToken,

    /// Token is valid but its subject no longer exists
    #[error("User referenced by token does not exist")]
    StaleUserReference,

    #[error("Email already exists")]
    EmailAlreadyExists,

    // Authorization errors
    /// User role is not in the route's allow-list
    #[error("Insufficient permissions: role '{actual}' is not allowed")]
    InsufficientPermissions { allowed: Vec<Role>, actual: Role },

    // Internal errors
    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => AuthError::EmailAlreadyExists,
            other => AuthError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::InvalidToken => warn!("Invalid token attempt"),
            AuthError::ExpiredToken => warn!("Expired token attempt"),
            AuthError::RevokedToken => warn!("Revoked refresh token presented"),
            AuthError::MissingToken => warn!("Missing token in request"),
            AuthError::StaleUserReference => warn!("Token references a user that no longer exists"),
            AuthError::InsufficientPermissions { allowed, actual } => {
                warn!("Authorization failed: allowed roles {:?}, user has role '{}'", allowed, actual)
            }
            AuthError::KeyUnavailable(msg) => error!("Signing key unavailable: {}", msg),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::DatabaseError(msg) => error!("Database error in auth: {}", msg),
            AuthError::ConfigError(msg) => error!("Authorization configuration error: {}", msg),
            _ => {}
        }

        let body = Json(json!({
            "error": self.error_message(),
        }));

        (status, body).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::RevokedToken => StatusCode::UNAUTHORIZED,
            AuthError::StaleUserReference => StatusCode::BAD_REQUEST,
            AuthError::EmailAlreadyExists => StatusCode::BAD_REQUEST,
            AuthError::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            AuthError::KeyUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::InsufficientPermissions { .. } => {
                "You don't have enough permissions".to_string()
            }
            AuthError::KeyUnavailable(_)
            | AuthError::TokenGenerationError(_)
            | AuthError::PasswordHashError
            | AuthError::DatabaseError(_)
            | AuthError::ConfigError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
