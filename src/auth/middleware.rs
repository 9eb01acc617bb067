// Authentication and authorization gate for protected routes
//
// Unauthenticated -> (token present & valid) -> Authenticated -> (role allowed) -> Authorized.
// Any failure short-circuits; 401 is always decided before 403.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::auth::{cookies::ACCESS_TOKEN_COOKIE, error::AuthError, models::Role, token::TokenService};

/// Authenticated principal attached to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub role: Role,
}

/// Pull the access token from the `accessToken` cookie, falling back to `Authorization: Bearer`
pub fn extract_access_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
        return Ok(cookie.value().to_string());
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::InvalidToken)
}

/// Verify the request's access token and return the principal it names
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
    let token = extract_access_token(headers)?;
    let claims = tokens.verify_access(&token)?;

    Ok(AuthenticatedUser {
        user_id: claims.user_id()?,
        role: claims.role,
    })
}

/// Require the principal's role to be one of `allowed`
pub fn authorize(user: &AuthenticatedUser, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions {
            allowed: allowed.to_vec(),
            actual: user.role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already verified by RequireRole on this route
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(*user);
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        authenticate(&tokens, &parts.headers).map_err(|e| {
            warn!("Authentication failed for {}: {}", parts.uri.path(), e);
            e
        })
    }
}

/// Role gate for a group of routes
#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    allowed: &'static [Role],
}

impl RequireRole {
    /// Create a new RequireRole middleware with the given allow-list
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// ADMIN only
    pub const fn admin() -> Self {
        Self::new(&[Role::Admin])
    }

    /// ADMIN or MANAGER
    pub const fn staff() -> Self {
        Self::new(&[Role::Admin, Role::Manager])
    }

    /// Authenticate, authorize, then hand the principal to the handler via request extensions
    pub async fn middleware(
        self,
        tokens: &TokenService,
        mut request: Request,
        next: Next,
    ) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        let user = authenticate(tokens, request.headers()).map_err(|e| {
            warn!("Authentication failed for protected endpoint {}: {}", endpoint, e);
            e
        })?;

        if let Err(e) = authorize(&user, self.allowed) {
            warn!(
                "Authorization failed: user_id={}, allowed_roles={:?}, actual_role={}, endpoint={}",
                user.user_id, self.allowed, user.role, endpoint
            );
            return Err(e);
        }

        debug!(
            "Authorization successful: user_id={}, role={}, endpoint={}",
            user.user_id, user.role, endpoint
        );
        request.extensions_mut().insert(user);
        Ok(next.run(request).await)
    }
}

/// `from_fn_with_state` entry point for ADMIN-only routes
pub async fn require_admin(
    State(tokens): State<Arc<TokenService>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    RequireRole::admin().middleware(&tokens, request, next).await
}

/// `from_fn_with_state` entry point for ADMIN or MANAGER routes
pub async fn require_staff(
    State(tokens): State<Arc<TokenService>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    RequireRole::staff().middleware(&tokens, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::test_keys::key_material;
    use crate::auth::token::tamper_signature;
    use axum::{body::Body, http::HeaderValue, http::StatusCode, middleware, routing::get, Router};
    use axum_test::TestServer;
    use proptest::prelude::*;

    // Helper to create a test token service
    fn test_tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(key_material()))
    }

    // Helper to create test parts with the given headers
    fn parts_with(headers: &[(header::HeaderName, String)]) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let (parts, _) = builder.body(Body::empty()).unwrap().into_parts();
        parts
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    fn access_cookie(token: &str) -> (header::HeaderName, String) {
        (header::COOKIE, format!("{}={}", ACCESS_TOKEN_COOKIE, token))
    }

    #[tokio::test]
    async fn test_valid_bearer_token_is_accepted() {
        let tokens = test_tokens();
        let token = tokens.issue_access_token(42, Role::Manager).unwrap();

        let mut parts = parts_with(&[bearer(&token)]);
        let user = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await.unwrap();

        assert_eq!(user, AuthenticatedUser { user_id: 42, role: Role::Manager });
    }

    #[tokio::test]
    async fn test_cookie_wins_over_header() {
        let tokens = test_tokens();
        let from_cookie = tokens.issue_access_token(1, Role::Admin).unwrap();
        let from_header = tokens.issue_access_token(2, Role::Customer).unwrap();

        let mut parts = parts_with(&[access_cookie(&from_cookie), bearer(&from_header)]);
        let user = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await.unwrap();

        assert_eq!(user.user_id, 1);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let tokens = test_tokens();
        let mut parts = parts_with(&[]);

        let result = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_invalid_bearer_format() {
        let tokens = test_tokens();

        for value in ["InvalidFormat token", "token_without_bearer", "Basic dXNlcjpwYXNz", "Bearer "] {
            let mut parts = parts_with(&[(header::AUTHORIZATION, value.to_string())]);
            let result = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await;
            assert!(matches!(result, Err(AuthError::InvalidToken)), "{}", value);
        }
    }

    #[tokio::test]
    async fn test_tampered_token_is_rejected() {
        let tokens = test_tokens();
        let token = tokens.issue_access_token(1, Role::Admin).unwrap();

        let mut parts = parts_with(&[access_cookie(&tamper_signature(&token))]);
        let result = AuthenticatedUser::from_request_parts(&mut parts, &tokens).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_authorize_is_set_membership() {
        let customer = AuthenticatedUser { user_id: 1, role: Role::Customer };
        let manager = AuthenticatedUser { user_id: 2, role: Role::Manager };

        assert!(authorize(&manager, &[Role::Admin, Role::Manager]).is_ok());
        assert!(matches!(
            authorize(&customer, &[Role::Admin]),
            Err(AuthError::InsufficientPermissions { actual: Role::Customer, .. })
        ));
        assert!(authorize(&customer, &[]).is_err());
    }

    // ===== RequireRole middleware =====

    fn admin_server(tokens: Arc<TokenService>) -> TestServer {
        let app = Router::new()
            .route(
                "/admin",
                get(|user: AuthenticatedUser| async move { format!("hello {}", user.user_id) }),
            )
            .route_layer(middleware::from_fn_with_state(tokens.clone(), require_admin))
            .with_state(tokens);
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_require_admin_allows_admin() {
        let tokens = test_tokens();
        let token = tokens.issue_access_token(7, Role::Admin).unwrap();
        let server = admin_server(tokens);

        let response = server
            .get("/admin")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "hello 7");
    }

    #[tokio::test]
    async fn test_require_admin_forbids_customer() {
        let tokens = test_tokens();
        let token = tokens.issue_access_token(7, Role::Customer).unwrap();
        let server = admin_server(tokens);

        let response = server
            .get("/admin")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap())
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_admin_checks_token_before_role() {
        let server = admin_server(test_tokens());

        let response = server.get("/admin").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .get("/admin")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not.a.token"))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_staff_gate_matches_role(
            role in prop_oneof![Just(Role::Admin), Just(Role::Manager), Just(Role::Customer)]
        ) {
            let user = AuthenticatedUser { user_id: 1, role };
            let allowed = RequireRole::staff().allowed;
            prop_assert_eq!(authorize(&user, allowed).is_ok(), role != Role::Customer);
        }
    }
}
