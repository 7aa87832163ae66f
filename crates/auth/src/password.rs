//! Slow salted hashing for API keys
//!
//! Keys are stored as Argon2id PHC strings. Verification is deliberately
//! expensive; the credential cache exists so it runs once per key per TTL.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, Result};

/// Argon2id hasher for new keys
///
/// Cost parameters only apply when hashing; verification reads them back
/// from the stored PHC string.
#[derive(Debug, Clone)]
pub struct KeyHasher {
    params: Params,
}

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyHasher {
    /// Hasher with the argon2 crate's recommended parameters
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Hasher with explicit cost parameters
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Hash a secret
    ///
    /// Returns the PHC string: `$argon2id$v=19$m=...,t=...,p=...$salt$hash`
    ///
    /// # Example
    ///
    /// ```
    /// use sublink_auth::password::{KeyHasher, verify_password};
    ///
    /// let hash = KeyHasher::new().hash("subX_0_00").unwrap();
    /// assert!(hash.starts_with("$argon2id$"));
    /// assert!(verify_password("subX_0_00", &hash).unwrap());
    /// ```
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashError(format!("hash failed: {}", e)))
    }
}

/// Check a secret against a stored PHC hash
///
/// A mismatch is `Ok(false)`; only an unparseable hash is an error.
pub fn verify_password(secret: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::HashError(format!("invalid stored hash: {}", e)))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::HashError(format!("verification failed: {}", e))),
    }
}

/// Compares a raw key against a stored hash
///
/// Implementations are blocking and CPU-bound; the validator runs them off
/// the async worker threads.
pub trait KeyVerifier: Send + Sync + 'static {
    /// `Ok(false)` on mismatch, `Err` only for an unreadable hash
    fn verify(&self, raw_key: &str, hash: &str) -> Result<bool>;
}

/// [`KeyVerifier`] backed by [`verify_password`]
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Verifier;

impl KeyVerifier for Argon2Verifier {
    fn verify(&self, raw_key: &str, hash: &str) -> Result<bool> {
        verify_password(raw_key, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fast_hasher;

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let hash = hasher.hash("subX_1Pq8Ab_00ff").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let hash2 = hasher.hash("subX_1Pq8Ab_00ff").unwrap();
        assert_ne!(hash, hash2);
    }

    #[test]
    fn test_verify_match_and_mismatch() {
        let hash = fast_hasher().hash("subX_1Pq8Ab_00ff").unwrap();
        assert!(verify_password("subX_1Pq8Ab_00ff", &hash).unwrap());
        assert!(!verify_password("subX_1Pq8Ab_00fe", &hash).unwrap());
    }

    #[test]
    fn test_default_params_roundtrip() {
        let hash = KeyHasher::default().hash("key").unwrap();
        assert!(verify_password("key", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let result = verify_password("key", "not_a_phc_string");
        assert!(matches!(result, Err(AuthError::HashError(_))));
    }

    #[test]
    fn test_argon2_verifier_matches_verify_password() {
        let hash = fast_hasher().hash("key").unwrap();
        assert!(Argon2Verifier.verify("key", &hash).unwrap());
        assert!(!Argon2Verifier.verify("other", &hash).unwrap());
        assert!(Argon2Verifier.verify("key", "corrupt").is_err());
    }

    #[test]
    fn test_custom_params_recorded_in_hash() {
        let hash = fast_hasher().hash("key").unwrap();
        assert!(hash.contains("m=1024,t=1,p=1"));
    }
}
