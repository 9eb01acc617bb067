use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::models::normalize_email;
use crate::auth::password::PasswordService;
use crate::error::ApiError;
use crate::query::ValidatedUserQuery;
use crate::tenants::service::TenantService;
use crate::users::models::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges, UserPage, UserResponse};
use crate::users::repository::UserStore;

/// Service layer for user administration
///
/// Creates and updates are fully validated: the user must exist, the email must be
/// unique and a referenced tenant must exist.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    tenants: TenantService,
}

impl UserService {
    /// Create a new UserService
    pub fn new(users: Arc<dyn UserStore>, tenants: TenantService) -> Self {
        Self { users, tenants }
    }

    /// Create a user with an explicit role
    pub async fn create(&self, mut request: CreateUserRequest) -> Result<User, ApiError> {
        request.email = normalize_email(&request.email);
        request.validate()?;

        let email = request.email.clone();
        debug!("Requesting for creating user: {}", email);

        self.ensure_email_free(&email, None).await?;
        if let Some(tenant_id) = request.tenant_id {
            self.ensure_tenant_exists(tenant_id).await?;
        }

        let password_hash = PasswordService::hash(request.password).await?;
        let user = self
            .users
            .create(NewUser {
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email,
                password_hash,
                role: request.role,
                tenant_id: request.tenant_id,
            })
            .await?;

        info!("User created successfully: id={}, role={}", user.id, user.role);
        Ok(user)
    }

    /// Replace a user's names, email, role and tenant
    pub async fn update(&self, id: i32, mut request: UpdateUserRequest) -> Result<User, ApiError> {
        request.email = normalize_email(&request.email);
        request.validate()?;
        debug!("Requesting for updating user: id={}", id);

        let existing = self.get(id).await?;

        let email = request.email.clone();
        if email != existing.email {
            self.ensure_email_free(&email, Some(id)).await?;
        }
        if let Some(tenant_id) = request.tenant_id {
            self.ensure_tenant_exists(tenant_id).await?;
        }

        let changes = UserChanges {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email,
            role: request.role,
            tenant_id: request.tenant_id,
        };

        // The row may disappear between the existence check and the write
        let user = self
            .users
            .update(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("User", id))?;

        info!("User updated successfully: id={}", id);
        Ok(user)
    }

    pub async fn get(&self, id: i32) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", id))
    }

    pub async fn list(&self, query: ValidatedUserQuery) -> Result<UserPage, ApiError> {
        let (users, total) = self.users.list(&query).await?;
        debug!("Listed {} of {} users", users.len(), total);

        Ok(UserPage {
            current_page: query.current_page,
            per_page: query.per_page,
            total,
            data: users.into_iter().map(UserResponse::from).collect(),
        })
    }

    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        if !self.users.delete(id).await? {
            return Err(ApiError::not_found("User", id));
        }

        info!("User deleted successfully: id={}", id);
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, except: Option<i32>) -> Result<(), ApiError> {
        match self.users.find_by_email(email).await? {
            Some(other) if Some(other.id) != except => {
                warn!("Attempt to use an email that is already registered");
                Err(ApiError::BadRequest("Email is already exist".to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_tenant_exists(&self, tenant_id: i32) -> Result<(), ApiError> {
        if self.tenants.exists(tenant_id).await? {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!("Tenant with id {} does not exist", tenant_id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::tenants::models::TenantRequest;
    use crate::tenants::repository::InMemoryTenantStore;
    use crate::users::repository::InMemoryUserStore;

    fn service() -> UserService {
        UserService::new(
            InMemoryUserStore::new(),
            TenantService::new(InMemoryTenantStore::new()),
        )
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password: "secret-password".to_string(),
            role: Role::Manager,
            tenant_id: None,
        }
    }

    fn update_request(email: &str, tenant_id: Option<i32>) -> UpdateUserRequest {
        UpdateUserRequest {
            first_name: "Janet".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            role: Role::Admin,
            tenant_id,
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_normalizes_email() {
        let user = service().create(create_request("  Jane@Example.com ")).await.unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, Role::Manager);
        assert!(PasswordService::verify_password("secret-password", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let service = service();
        service.create(create_request("jane@example.com")).await.unwrap();

        let result = service.create(create_request("JANE@example.com")).await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg == "Email is already exist"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_tenant() {
        let result = service()
            .create(CreateUserRequest { tenant_id: Some(77), ..create_request("a@b.com") })
            .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let result = service().update(5, update_request("x@y.com", None)).await;
        assert!(matches!(result, Err(ApiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_rejects_email_of_another_user() {
        let service = service();
        let jane = service.create(create_request("jane@example.com")).await.unwrap();
        service.create(create_request("john@example.com")).await.unwrap();

        let result = service.update(jane.id, update_request("john@example.com", None)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_validates_tenant_and_applies_changes() {
        let tenants = TenantService::new(InMemoryTenantStore::new());
        let service = UserService::new(InMemoryUserStore::new(), tenants.clone());
        let jane = service.create(create_request("jane@example.com")).await.unwrap();

        let missing_tenant = service.update(jane.id, update_request("jane@example.com", Some(3))).await;
        assert!(matches!(missing_tenant, Err(ApiError::BadRequest(_))));

        let tenant = tenants
            .create(TenantRequest {
                name: "Acme".to_string(),
                address: "Road 1".to_string(),
            })
            .await
            .unwrap();
        let updated = service
            .update(jane.id, update_request("jane@example.com", Some(tenant.id)))
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.tenant_id, Some(tenant.id));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = service();
        let jane = service.create(create_request("jane@example.com")).await.unwrap();

        service.delete(jane.id).await.unwrap();
        assert!(matches!(service.get(jane.id).await, Err(ApiError::NotFound { .. })));
        assert!(matches!(service.delete(jane.id).await, Err(ApiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_returns_page_metadata() {
        let service = service();
        for i in 0..3 {
            service.create(create_request(&format!("u{}@x.com", i))).await.unwrap();
        }

        let page = service
            .list(ValidatedUserQuery { per_page: 2, ..ValidatedUserQuery::default() })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.per_page, 2);
        assert_eq!(page.data.len(), 2);
    }
}
