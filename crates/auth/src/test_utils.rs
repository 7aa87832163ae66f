//! Test utilities
//!
//! Token builders plus call-counting wrappers for the store and the hash
//! comparison. These drive the real validation code paths instead of
//! mocking them.

use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::Params;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::claims::TokenClaims;
use crate::error::Result;
use crate::key::{KeyRecord, NewKeyRecord};
use crate::password::{Argon2Verifier, KeyHasher, KeyVerifier};
use crate::store::CredentialStore;

/// Test secret for JWT signing (32 bytes for HS256)
pub const TEST_SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

/// Test secret for the identifier codec
pub const TEST_KEY_SECRET: &[u8] = b"s3cret";

/// Cheapest valid Argon2 parameters, for tests that hash many keys
pub fn fast_hasher() -> KeyHasher {
    KeyHasher::with_params(Params::new(1024, 1, 1, None).expect("valid argon2 params"))
}

/// Create a token for `username` signed with [`TEST_SECRET`]
pub fn create_test_token(username: &str) -> String {
    create_test_token_with_options(username, TEST_SECRET, Duration::hours(1))
}

/// Create a token signed with another secret
pub fn create_test_token_with_secret(username: &str, secret: &[u8]) -> String {
    create_test_token_with_options(username, secret, Duration::hours(1))
}

/// Create a token that expired an hour ago
pub fn create_expired_token(username: &str) -> String {
    create_test_token_with_options(username, TEST_SECRET, Duration::hours(-1))
}

/// Create a token with full control over secret and lifetime
pub fn create_test_token_with_options(username: &str, secret: &[u8], expires_in: Duration) -> String {
    let now = Utc::now();

    let claims = TokenClaims {
        username: username.to_string(),
        expires_at: (now + expires_in).timestamp(),
        issued_at: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .expect("failed to encode test JWT")
}

/// Store wrapper that counts calls
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    find_valid_calls: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            find_valid_calls: AtomicUsize::new(0),
        }
    }

    /// Wrapped store, bypassing the counters
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of `find_valid` calls so far
    pub fn find_valid_calls(&self) -> usize {
        self.find_valid_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: CredentialStore> CredentialStore for CountingStore<S> {
    async fn create(&self, record: NewKeyRecord) -> Result<i64> {
        self.inner.create(record).await
    }

    async fn get(&self, id: i64) -> Result<Option<KeyRecord>> {
        self.inner.get(id).await
    }

    async fn find_valid(&self, user_id: u32) -> Result<Vec<KeyRecord>> {
        self.find_valid_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_valid(user_id).await
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        self.inner.soft_delete(id).await
    }
}

/// Argon2 verifier that counts comparisons
#[derive(Debug, Default)]
pub struct CountingVerifier {
    comparisons: AtomicUsize,
}

impl CountingVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hash comparisons so far
    pub fn comparisons(&self) -> usize {
        self.comparisons.load(Ordering::SeqCst)
    }
}

impl KeyVerifier for CountingVerifier {
    fn verify(&self, raw_key: &str, hash: &str) -> Result<bool> {
        self.comparisons.fetch_add(1, Ordering::SeqCst);
        Argon2Verifier.verify(raw_key, hash)
    }
}
