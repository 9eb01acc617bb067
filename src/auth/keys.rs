// Signing key material, loaded once at startup and shared read-only

use std::fmt;
use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::{error, info};

use crate::auth::error::AuthError;

/// All cryptographic material the token subsystem needs
///
/// - RSA key pair for access tokens (RS256)
/// - shared secret for refresh tokens (HS256)
///
/// Built once and handed to [`crate::auth::token::TokenService`] through an `Arc`;
/// nothing reads keys from ambient state afterwards.
#[derive(Clone)]
pub struct KeyMaterial {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl KeyMaterial {
    /// Build key material from PEM bytes and the refresh secret
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        refresh_secret: &str,
    ) -> Result<Self, AuthError> {
        if refresh_secret.trim().is_empty() {
            return Err(AuthError::KeyUnavailable("refresh token secret is empty".to_string()));
        }

        let access_encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| AuthError::KeyUnavailable(format!("invalid private key: {}", e)))?;
        let access_decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| AuthError::KeyUnavailable(format!("invalid public key: {}", e)))?;

        Ok(Self {
            access_encoding,
            access_decoding,
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        })
    }

    /// Read the PEM files from disk and build key material
    ///
    /// Failure here is fatal for the process.
    pub fn load(
        private_key_path: &Path,
        public_key_path: &Path,
        refresh_secret: &str,
    ) -> Result<Self, AuthError> {
        let private_pem = read_key_file(private_key_path)?;
        let public_pem = read_key_file(public_key_path)?;

        let keys = Self::from_pem(&private_pem, &public_pem, refresh_secret)?;
        info!(
            "Loaded signing keys from {} and {}",
            private_key_path.display(),
            public_key_path.display()
        );
        Ok(keys)
    }

    pub(crate) fn access_encoding(&self) -> &EncodingKey {
        &self.access_encoding
    }

    pub(crate) fn access_decoding(&self) -> &DecodingKey {
        &self.access_decoding
    }

    pub(crate) fn refresh_encoding(&self) -> &EncodingKey {
        &self.refresh_encoding
    }

    pub(crate) fn refresh_decoding(&self) -> &DecodingKey {
        &self.refresh_decoding
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, AuthError> {
    std::fs::read(path).map_err(|e| {
        error!("Error while reading key file {}: {}", path.display(), e);
        AuthError::KeyUnavailable(format!("{}: {}", path.display(), e))
    })
}


#[cfg(test)]
mod tests {
    use super::test_keys::*;
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_pem_accepts_test_keys() {
        assert!(KeyMaterial::from_pem(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes(), REFRESH_SECRET).is_ok());
    }

    #[test]
    fn test_garbage_private_key_is_unavailable() {
        let result = KeyMaterial::from_pem(b"not a pem", PUBLIC_PEM.as_bytes(), REFRESH_SECRET);
        assert!(matches!(result, Err(AuthError::KeyUnavailable(_))));
    }

    #[test]
    fn test_empty_refresh_secret_rejected() {
        let result = KeyMaterial::from_pem(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes(), "");
        assert!(matches!(result, Err(AuthError::KeyUnavailable(_))));
    }

    #[test]
    fn test_missing_key_file_is_unavailable() {
        let result = KeyMaterial::load(
            &PathBuf::from("certs/does-not-exist/private.pem"),
            &PathBuf::from("certs/test/public.pem"),
            REFRESH_SECRET,
        );
        assert!(matches!(result, Err(AuthError::KeyUnavailable(msg)) if msg.contains("does-not-exist")));
    }

    #[test]
    fn test_load_from_disk() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let keys = KeyMaterial::load(
            &root.join("certs/test/private.pem"),
            &root.join("certs/test/public.pem"),
            REFRESH_SECRET,
        );
        assert!(keys.is_ok());
    }

    #[test]
    fn test_debug_does_not_print_keys() {
        let keys = key_material();
        assert_eq!(format!("{:?}", keys), "KeyMaterial { .. }");
    }
}
