// Authentication module
// Dual-token sessions: stateless RS256 access tokens, stateful HS256 refresh tokens

pub mod cookies;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod middleware;
pub mod models;
pub mod password;
pub mod refresh;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use cookies::SessionCookies;
pub use error::AuthError;
pub use keys::KeyMaterial;
pub use middleware::{authenticate, authorize, AuthenticatedUser, RequireRole};
pub use models::Role;
pub use repository::{InMemoryTokenStore, RefreshTokenStore, TokenRepository};
pub use service::AuthService;
pub use token::TokenService;
