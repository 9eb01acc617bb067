// User data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::models::Role;

/// User database model
///
/// Holds the password hash, so it is never serialized directly; use [`UserResponse`].
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Column list matching the field order of [`User`]
    pub const COLUMNS: &'static str =
        "id, first_name, last_name, email, password_hash, role, tenant_id, created_at, updated_at";
}

/// User as exposed over HTTP (no password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            tenant_id: user.tenant_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Values for inserting a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<i32>,
}

/// Replacement values for an administrative update
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: Option<i32>,
}

/// Request body for POST /users
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(email(message = "Email should be a valid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password length should be at least 8 chars"))]
    pub password: String,
    pub role: Role,
    #[validate(range(min = 1, message = "Tenant id must be positive"))]
    pub tenant_id: Option<i32>,
}

/// Request body for PATCH /users/:id
///
/// Every field is replaced; an absent `tenantId` detaches the user from its tenant.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(email(message = "Email should be a valid email"))]
    pub email: String,
    pub role: Role,
    #[validate(range(min = 1, message = "Tenant id must be positive"))]
    pub tenant_id: Option<i32>,
}

/// One page of the user listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub data: Vec<UserResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            role: Role::Manager,
            tenant_id: Some(3),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let json = serde_json::to_value(UserResponse::from(sample_user())).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["role"], "manager");
        assert_eq!(json["tenantId"], 3);
    }

    #[test]
    fn test_create_user_request_deserializes_camel_case() {
        let request: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.com",
            "password": "Rb!-4593",
            "role": "manager",
            "tenantId": 2
        }))
        .unwrap();

        assert_eq!(request.role, Role::Manager);
        assert_eq!(request.tenant_id, Some(2));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_user_request_rejects_bad_values() {
        let request = UpdateUserRequest {
            first_name: "  ".to_string(),
            last_name: "B".to_string(),
            email: "not-an-email".to_string(),
            role: Role::Customer,
            tenant_id: Some(0),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("tenant_id"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<UpdateUserRequest>(serde_json::json!({
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.com",
            "role": "superuser"
        }));
        assert!(result.is_err());
    }
}
