// Password hashing and verification service

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

use crate::auth::error::AuthError;

/// Password service for hashing and verification
///
/// Uses Argon2id with the crate defaults (19 MiB, 2 iterations), so hashing and
/// verification take tens of milliseconds.
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id
    ///
    /// Returns a PHC string that embeds the salt and parameters.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!("Stored password hash is malformed: {}", e);
            AuthError::PasswordHashError
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Burn the same amount of work as a real verification
    ///
    /// Called when the account does not exist so that an unknown email and a wrong
    /// password take comparable time.
    pub fn verify_against_dummy(password: &str) {
        if let Some(hash) = dummy_hash() {
            let _ = Self::verify_password(password, hash);
        }
    }

    /// Compute the dummy hash now rather than on the first unknown-email login
    pub fn prime_dummy_hash() {
        if dummy_hash().is_none() {
            error!("Dummy password hash could not be computed");
        }
    }

    /// [`Self::hash_password`] on the blocking thread pool
    pub async fn hash(password: String) -> Result<String, AuthError> {
        run_blocking(move || Self::hash_password(&password)).await?
    }

    /// [`Self::verify_password`] on the blocking thread pool
    pub async fn verify(password: String, hash: String) -> Result<bool, AuthError> {
        run_blocking(move || Self::verify_password(&password, &hash)).await?
    }

    /// [`Self::verify_against_dummy`] on the blocking thread pool
    pub async fn verify_dummy(password: String) -> Result<(), AuthError> {
        run_blocking(move || Self::verify_against_dummy(&password)).await
    }
}

fn dummy_hash() -> Option<&'static String> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| PasswordService::hash_password("dummy-password-for-timing").ok())
        .as_ref()
}

// Argon2 takes tens of milliseconds; keep it off the async workers
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!("Password hashing task failed: {}", e);
        AuthError::PasswordHashError
    })
}
