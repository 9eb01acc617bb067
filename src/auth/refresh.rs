// Refresh token issuance, verification and rotation
//
// A refresh token is valid only while its signature checks out AND the
// refresh_tokens row named by its `jti` still exists.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::RefreshTokenRecord,
    repository::RefreshTokenStore,
    token::{RefreshTokenClaims, TokenService, REFRESH_TOKEN_TTL_SECS},
};
use crate::users::models::User;

/// Result of a successful rotation
#[derive(Debug, Clone)]
pub struct RotatedTokens {
    pub record: RefreshTokenRecord,
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateful half of the token subsystem
#[derive(Clone)]
pub struct RefreshTokenManager {
    tokens: Arc<TokenService>,
    store: Arc<dyn RefreshTokenStore>,
}

impl RefreshTokenManager {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn RefreshTokenStore>) -> Self {
        Self { tokens, store }
    }

    /// Persist a new record for `user` and sign a refresh token bound to it
    pub async fn issue_refresh_token(&self, user: &User) -> Result<(RefreshTokenRecord, String), AuthError> {
        let expires_at = Utc::now() + Duration::seconds(REFRESH_TOKEN_TTL_SECS);
        let record = self.store.insert(user.id, expires_at).await?;

        let token = self
            .tokens
            .sign_refresh_token(user.id, user.role, record.id, record.expires_at)?;

        debug!("Issued refresh token {} for user {}", record.id, user.id);
        Ok((record, token))
    }

    /// Verify signature, issuer and expiry, then require the backing record
    ///
    /// A missing or expired record is `RevokedToken` even when the signature is valid.
    pub async fn verify_refresh(&self, token: &str) -> Result<RefreshTokenClaims, AuthError> {
        let claims = self.tokens.decode_refresh(token)?;
        let token_id = claims.token_id()?;

        match self.store.find(token_id).await? {
            Some(record) if !record.is_expired(Utc::now()) => Ok(claims),
            _ => {
                warn!("Refresh token {} is no longer on record", token_id);
                Err(AuthError::RevokedToken)
            }
        }
    }

    /// Replace record `old_id` with a new one and mint a fresh token pair for `user`
    ///
    /// Only the first rotation of a given record succeeds; later attempts observe the
    /// record gone and fail with `RevokedToken`.
    pub async fn rotate(&self, old_id: i32, user: &User) -> Result<RotatedTokens, AuthError> {
        let expires_at = Utc::now() + Duration::seconds(REFRESH_TOKEN_TTL_SECS);

        let record = self
            .store
            .rotate(old_id, user.id, expires_at)
            .await?
            .ok_or_else(|| {
                warn!("Refresh token {} was already rotated or revoked", old_id);
                AuthError::RevokedToken
            })?;

        let refresh_token = self
            .tokens
            .sign_refresh_token(user.id, user.role, record.id, record.expires_at)?;
        let access_token = self.tokens.issue_access_token(user.id, user.role)?;

        info!("Rotated refresh token {} -> {} for user {}", old_id, record.id, user.id);
        Ok(RotatedTokens {
            record,
            access_token,
            refresh_token,
        })
    }

    /// Delete a record. Deleting an id that is already gone is not an error.
    pub async fn revoke(&self, token_id: i32) -> Result<bool, AuthError> {
        let removed = self.store.delete(token_id).await?;
        if removed {
            info!("Revoked refresh token {}", token_id);
        } else {
            debug!("Refresh token {} was already gone", token_id);
        }
        Ok(removed)
    }

    /// Sweep records past their expiry
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let removed = self.store.delete_expired().await?;
        info!("Purged {} expired refresh tokens", removed);
        Ok(removed)
    }
}
