// Runtime configuration loaded from the environment (and an optional .env file)

use crate::auth::error::AuthError;
use std::path::PathBuf;

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub refresh_token_secret: String,
    pub cookie_domain: String,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    /// Build the configuration from environment variables
    ///
    /// `DATABASE_URL` and `REFRESH_TOKEN_SECRET` are required; everything else has a default.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AuthError::ConfigError(format!("{} must be set", key)))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AuthError::ConfigError(format!("PORT is not a valid port: {}", raw)))?,
            None => 5501,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            private_key_path: lookup("PRIVATE_KEY_PATH")
                .unwrap_or_else(|| "certs/private.pem".to_string())
                .into(),
            public_key_path: lookup("PUBLIC_KEY_PATH")
                .unwrap_or_else(|| "certs/public.pem".to_string())
                .into(),
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            cookie_domain: lookup("COOKIE_DOMAIN").unwrap_or_else(|| "localhost".to_string()),
            cors_origin: lookup("CORS_ORIGIN"),
        })
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
