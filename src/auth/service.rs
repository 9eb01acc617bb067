// Authentication service - business logic layer

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{normalize_email, AuthSession, LoginRequest, RegisterRequest, Role},
    password::PasswordService,
    refresh::RefreshTokenManager,
    repository::RefreshTokenStore,
    token::TokenService,
};
use crate::users::models::{NewUser, User};
use crate::users::repository::UserStore;

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    refresh: RefreshTokenManager,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let refresh = RefreshTokenManager::new(tokens.clone(), refresh_tokens);
        Self { users, tokens, refresh }
    }

    /// Register a new CUSTOMER and open a session for it
    pub async fn register(&self, mut request: RegisterRequest) -> Result<AuthSession, AuthError> {
        request.email = normalize_email(&request.email);
        request
            .validate()
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;

        let email = request.email.clone();
        debug!("New request to register user: {}", email);

        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Registration attempted with an existing email");
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = PasswordService::hash(request.password).await?;
        let user = self
            .users
            .create(NewUser {
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email,
                password_hash,
                role: Role::Customer,
                tenant_id: None,
            })
            .await?;

        info!("User has been registered: id={}", user.id);
        self.open_session(user).await
    }

    /// Check credentials and open a session
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, mut request: LoginRequest) -> Result<AuthSession, AuthError> {
        request.email = normalize_email(&request.email);
        request
            .validate()
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;

        debug!("New request to login: {}", request.email);

        let Some(user) = self.users.find_by_email(&request.email).await? else {
            PasswordService::verify_dummy(request.password).await?;
            warn!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify(request.password, user.password_hash.clone()).await? {
            warn!("Login failed: wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User has been logged in: id={}", user.id);
        self.open_session(user).await
    }

    /// Exchange a refresh token for a new token pair, invalidating the presented one
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let claims = self.refresh.verify_refresh(refresh_token).await?;
        let user_id = claims.user_id()?;

        let user = self.users.find_by_id(user_id).await?.ok_or_else(|| {
            warn!("Refresh token {} references missing user {}", claims.jti, user_id);
            AuthError::StaleUserReference
        })?;

        let rotated = self.refresh.rotate(claims.token_id()?, &user).await?;

        Ok(AuthSession {
            user,
            access_token: rotated.access_token,
            refresh_token: rotated.refresh_token,
        })
    }

    /// Revoke the refresh token if one is presented
    ///
    /// Best-effort: an unusable token or a failing delete is logged and swallowed.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token.filter(|t| !t.is_empty()) else {
            debug!("Logout without a refresh token");
            return;
        };

        let token_id = match self.tokens.decode_refresh(token).and_then(|c| c.token_id()) {
            Ok(id) => id,
            Err(e) => {
                debug!("Logout with unusable refresh token: {}", e);
                return;
            }
        };

        if let Err(e) = self.refresh.revoke(token_id).await {
            error!("Failed to revoke refresh token {} during logout: {}", token_id, e);
        }
    }

    /// Load the user named by an access token
    pub async fn current_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::StaleUserReference)
    }

    /// Delete refresh token records past their expiry
    pub async fn purge_expired_refresh_tokens(&self) -> Result<u64, AuthError> {
        self.refresh.purge_expired().await
    }

    async fn open_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let access_token = self.tokens.issue_access_token(user.id, user.role)?;
        let (_, refresh_token) = self.refresh.issue_refresh_token(&user).await?;

        Ok(AuthSession {
            user,
            access_token,
            refresh_token,
        })
    }
}
