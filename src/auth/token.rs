// JWT issuance and verification
//
// Access tokens: RS256, 1 hour, stateless.
// Refresh tokens: HS256, 1 year, `jti` bound to a refresh_tokens row (see auth::refresh).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::{error::AuthError, keys::KeyMaterial, models::Role};

/// Fixed `iss` claim for every token this service signs
pub const TOKEN_ISSUER: &str = "auth-service";

/// Access token lifetime (1 hour)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime (1 year)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 365;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String, // user_id
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<i32, AuthError> {
        parse_subject(&self.sub)
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String, // user_id
    pub role: Role,
    pub jti: String, // refresh_tokens.id
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshTokenClaims {
    pub fn user_id(&self) -> Result<i32, AuthError> {
        parse_subject(&self.sub)
    }

    /// Id of the refresh_tokens row backing this token
    pub fn token_id(&self) -> Result<i32, AuthError> {
        self.jti.parse::<i32>().map_err(|_| AuthError::InvalidToken)
    }
}

fn parse_subject(sub: &str) -> Result<i32, AuthError> {
    sub.parse::<i32>().map_err(|_| AuthError::InvalidToken)
}

/// Token service for JWT operations
///
/// Holds no mutable state; clone the `Arc` freely across requests.
pub struct TokenService {
    keys: Arc<KeyMaterial>,
}

impl TokenService {
    /// Create a new TokenService over already-loaded key material
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        Self { keys }
    }

    /// Sign a short-lived access token for `user_id` with `role`
    pub fn issue_access_token(&self, user_id: i32, role: Role) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            role,
            iss: TOKEN_ISSUER.to_string(),
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, self.keys.access_encoding())
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Sign a refresh token whose `jti` is the backing record id
    ///
    /// `expires_at` comes from the record so the token and the row expire together.
    pub fn sign_refresh_token(
        &self,
        user_id: i32,
        role: Role,
        token_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = RefreshTokenClaims {
            sub: user_id.to_string(),
            role,
            jti: token_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, self.keys.refresh_encoding())
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Verify an access token: RS256 signature, issuer, expiry. No store lookup.
    pub fn verify_access(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        decode::<AccessTokenClaims>(token, self.keys.access_decoding(), &validation(Algorithm::RS256))
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Verify the cryptographic half of a refresh token: HS256 signature, issuer, expiry
    ///
    /// This does NOT consult the store; use
    /// [`crate::auth::refresh::RefreshTokenManager::verify_refresh`] to accept a token.
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshTokenClaims, AuthError> {
        decode::<RefreshTokenClaims>(token, self.keys.refresh_decoding(), &validation(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

fn validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    }
}

/// Replace the last three characters of a token's signature segment
#[cfg(test)]
pub(crate) fn tamper_signature(token: &str) -> String {
    let (head, tail) = token.split_at(token.len() - 3);
    let replacement = if tail == "abc" { "xyz" } else { "abc" };
    format!("{}{}", head, replacement)
}
