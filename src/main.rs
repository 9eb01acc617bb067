pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod tenants;
pub mod users;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    handlers::{login_handler, logout_handler, refresh_handler, register_handler, self_handler},
    middleware::{require_admin, require_staff},
    models::{IdResponse, LoginRequest, RegisterRequest, Role},
    password::PasswordService,
    AuthService, KeyMaterial, RefreshTokenStore, SessionCookies, TokenRepository, TokenService,
};
use config::AppConfig;
use db::DbPool;
use tenants::{
    handlers::{create_tenant, delete_tenant, get_tenant, list_tenants, update_tenant},
    Tenant, TenantRepository, TenantRequest, TenantService, TenantStore,
};
use users::{
    handlers::{create_user, delete_user, get_user, list_users, update_user},
    models::{CreateUserRequest, UpdateUserRequest, UserPage},
    UserRepository, UserResponse, UserService, UserStore,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        auth::handlers::logout_handler,
        auth::handlers::self_handler,
        users::handlers::create_user,
        users::handlers::list_users,
        users::handlers::get_user,
        users::handlers::update_user,
        users::handlers::delete_user,
        tenants::handlers::create_tenant,
        tenants::handlers::list_tenants,
        tenants::handlers::get_tenant,
        tenants::handlers::update_tenant,
        tenants::handlers::delete_tenant,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, IdResponse, Role,
            UserResponse, UserPage, CreateUserRequest, UpdateUserRequest,
            Tenant, TenantRequest
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session token endpoints"),
        (name = "users", description = "User administration (admin only)"),
        (name = "tenants", description = "Tenant administration")
    ),
    info(
        title = "Auth Service API",
        version = "1.0.0",
        description = "Multi-tenant identity service issuing access and refresh tokens"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub tenant_service: TenantService,
    pub tokens: Arc<TokenService>,
    pub cookies: SessionCookies,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        keys: Arc<KeyMaterial>,
        users: Arc<dyn UserStore>,
        tenants: Arc<dyn TenantStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        cookie_domain: &str,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(keys));
        let tenant_service = TenantService::new(tenants);

        Self {
            auth_service: AuthService::new(users.clone(), tokens.clone(), refresh_tokens),
            user_service: UserService::new(users, tenant_service.clone()),
            tenant_service,
            tokens,
            cookies: SessionCookies::new(cookie_domain),
        }
    }

    /// State backed by PostgreSQL repositories
    pub fn with_postgres(pool: DbPool, keys: Arc<KeyMaterial>, cookie_domain: &str) -> Self {
        Self::new(
            keys,
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(TenantRepository::new(pool.clone())),
            Arc::new(TokenRepository::new(pool)),
            cookie_domain,
        )
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Handler for GET /
async fn health_check() -> &'static str {
    "Auth-Service health check 1.0.0"
}

fn cors_layer(cors_origin: Option<&str>) -> CorsLayer {
    match cors_origin.map(HeaderValue::from_str) {
        // Cookies need an explicit origin and credentials
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN is not a valid header value; allowing any origin");
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    }
}

/// Creates and configures the application router
///
/// Role gates are route layers, so unknown paths still 404 instead of 401.
pub fn create_router(state: AppState, cors_origin: Option<&str>) -> Router {
    let admin_routes = Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/tenants", post(create_tenant))
        .route("/tenants/:id", patch(update_tenant).delete(delete_tenant))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let staff_routes = Router::new()
        .route("/tenants", get(list_tenants))
        .route("/tenants/:id", get(get_tenant))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(health_check))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/self", get(self_handler))
        .merge(admin_routes)
        .merge(staff_routes)
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG controls verbosity; default to info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Auth Service - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Key material is loaded once; without it no token can be issued or checked
    let keys = KeyMaterial::load(
        &config.private_key_path,
        &config.public_key_path,
        &config.refresh_token_secret,
    )
    .expect("Failed to load signing keys");

    // The first unknown-email login must not pay for building the dummy hash
    PasswordService::prime_dummy_hash();

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let state = AppState::with_postgres(db_pool, Arc::new(keys), &config.cookie_domain);

    if let Err(e) = state.auth_service.purge_expired_refresh_tokens().await {
        tracing::warn!("Could not purge expired refresh tokens: {}", e);
    }

    let app = create_router(state, config.cors_origin.as_deref());

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Auth Service is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
