use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Tenant database model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a tenant
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TenantRequest {
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[validate(length(max = 100, message = "Tenant name should not exceed 100 characters"))]
    pub name: String,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[validate(length(max = 255, message = "Tenant address should not exceed 255 characters"))]
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_request_validation() {
        let valid = TenantRequest {
            name: "Pizza Corner".to_string(),
            address: "12 Main Street".to_string(),
        };
        assert!(valid.validate().is_ok());

        let blank_name = TenantRequest { name: " ".to_string(), ..valid.clone() };
        assert!(blank_name.validate().is_err());

        let long_address = TenantRequest { address: "x".repeat(256), ..valid };
        assert!(long_address.validate().is_err());
    }

    #[test]
    fn test_tenant_serializes_camel_case() {
        let tenant = Tenant {
            id: 1,
            name: "T".to_string(),
            address: "A".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(tenant).unwrap();
        assert!(json.get("createdAt").is_some());
    }
}
