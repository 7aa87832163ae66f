//! API key validator
//!
//! Validates `subX_<id>_<random>` keys presented in the `X-API-Key` header:
//!
//! 1. Credential cache lookup (fast path)
//! 2. Split into three segments
//! 3. Decode the user ID with the configured secret
//! 4. Load the user's valid key records from the store
//! 5. Argon2-verify the raw key against each record until one matches
//! 6. Cache the match
//!
//! The scan in step 5 is linear in the user's active keys, and each
//! comparison is slow on purpose. Users hold few keys, and the cache means
//! the scan runs once per key per TTL. It runs on the blocking pool, so only
//! the request being validated waits for it.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::CredentialCache;
use crate::codec::IdentifierCodec;
use crate::error::{AuthError, Result};
use crate::key::{KeyRecord, split_api_key};
use crate::password::{Argon2Verifier, KeyVerifier};
use crate::provider::AuthProvider;
use crate::store::CredentialStore;

/// API key validator
///
/// A missing identifier secret is not a construction error: the validator is
/// still built and every uncached key fails with
/// [`AuthError::MissingSecret`].
///
/// # Example
///
/// ```ignore
/// let cache = Arc::new(CredentialCache::default());
/// let store: Arc<dyn CredentialStore> = Arc::new(MemoryKeyStore::new());
/// let validator = ApiKeyValidator::new(Some(b"s3cret"), store, cache);
///
/// let username = validator.validate_key("subX_1Pq8Ab_...").await?;
/// ```
pub struct ApiKeyValidator {
    codec: Option<IdentifierCodec>,
    store: Arc<dyn CredentialStore>,
    cache: Arc<CredentialCache>,
    verifier: Arc<dyn KeyVerifier>,
}

impl std::fmt::Debug for ApiKeyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyValidator")
            .field("has_secret", &self.codec.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl ApiKeyValidator {
    /// Create a validator
    ///
    /// # Arguments
    ///
    /// * `secret` - Identifier codec secret, `None` if not configured
    /// * `store` - Key record store
    /// * `cache` - Shared credential cache
    pub fn new(
        secret: Option<&[u8]>,
        store: Arc<dyn CredentialStore>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self {
            codec: secret.map(IdentifierCodec::new),
            store,
            cache,
            verifier: Arc::new(Argon2Verifier),
        }
    }

    /// Replace the hash comparison
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn KeyVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Shared cache handle
    pub fn cache(&self) -> &Arc<CredentialCache> {
        &self.cache
    }

    /// Validate a raw API key and return the owning username
    pub async fn validate_key(&self, raw_key: &str) -> Result<String> {
        let start = Instant::now();

        if let Some(username) = self.cache.get(raw_key) {
            debug!(elapsed = ?start.elapsed(), "API key cache hit");
            return Ok(username);
        }

        let result = self.verify_uncached(raw_key).await;

        match &result {
            Ok(username) => {
                debug!(user = %username, elapsed = ?start.elapsed(), "API key verified");
            }
            Err(e) => {
                debug!(error = %e, elapsed = ?start.elapsed(), "API key verification failed");
            }
        }

        result
    }

    async fn verify_uncached(&self, raw_key: &str) -> Result<String> {
        let parts = split_api_key(raw_key)?;

        let codec = self
            .codec
            .as_ref()
            .ok_or(AuthError::MissingSecret("api_key_secret"))?;

        let user_id = codec.decode(parts.encoded_id)?;

        let candidates = self.store.find_valid(user_id).await?;

        let verifier = Arc::clone(&self.verifier);
        let owned_key = raw_key.to_string();
        let matched =
            tokio::task::spawn_blocking(move || first_match(&*verifier, &owned_key, candidates))
                .await
                .map_err(|e| AuthError::VerifyTask(e.to_string()))?;

        match matched {
            Some(username) => {
                self.cache.set(raw_key, username.as_str());
                Ok(username)
            }
            None => Err(AuthError::KeyRejected),
        }
    }
}

/// Username of the first candidate whose hash matches, stopping there
fn first_match(
    verifier: &dyn KeyVerifier,
    raw_key: &str,
    candidates: Vec<KeyRecord>,
) -> Option<String> {
    for record in candidates {
        match record.verify(verifier, raw_key) {
            Ok(true) => return Some(record.username),
            Ok(false) => {}
            Err(e) => {
                warn!(key_id = record.id, error = %e, "Skipping key record with unreadable hash");
            }
        }
    }
    None
}

#[async_trait]
impl AuthProvider for ApiKeyValidator {
    async fn validate(&self, credential: &str) -> Result<String> {
        self.validate_key(credential).await
    }

    fn name(&self) -> &'static str {
        "apikey"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use crate::key::{NewKeyRecord, generate_api_key};
    use crate::store::MemoryKeyStore;
    use crate::test_utils::{CountingStore, CountingVerifier, fast_hasher};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    const SECRET: &[u8] = b"s3cret";

    struct Fixture {
        store: Arc<CountingStore<MemoryKeyStore>>,
        cache: Arc<CredentialCache>,
        verifier: Arc<CountingVerifier>,
        validator: ApiKeyValidator,
    }

    fn fixture(secret: Option<&[u8]>) -> Fixture {
        let store = Arc::new(CountingStore::new(MemoryKeyStore::new()));
        let cache = Arc::new(CredentialCache::default());
        let verifier = Arc::new(CountingVerifier::new());
        let validator = ApiKeyValidator::new(
            secret,
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Arc::clone(&cache),
        )
        .with_verifier(Arc::clone(&verifier) as Arc<dyn KeyVerifier>);
        Fixture {
            store,
            cache,
            verifier,
            validator,
        }
    }

    async fn issue_key(
        fx: &Fixture,
        user_id: u32,
        username: &str,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> (String, i64) {
        let codec = IdentifierCodec::new(SECRET);
        let key = generate_api_key(&codec, &fast_hasher(), user_id, username, "", expires_at)
            .unwrap();
        let id = fx.store.inner().create(key.record).await.unwrap();
        (key.raw_key, id)
    }

    #[tokio::test]
    async fn test_first_validation_queries_store_then_caches() {
        let fx = fixture(Some(SECRET));
        let (raw_key, _) = issue_key(&fx, 42, "alice", None).await;

        let username = fx.validator.validate_key(&raw_key).await.unwrap();
        assert_eq!(username, "alice");
        assert_eq!(fx.store.find_valid_calls(), 1);
        assert_eq!(fx.verifier.comparisons(), 1);
        assert_eq!(fx.cache.get(&raw_key).as_deref(), Some("alice"));

        let username = fx.validator.validate_key(&raw_key).await.unwrap();
        assert_eq!(username, "alice");
        // Served from cache
        assert_eq!(fx.store.find_valid_calls(), 1);
        assert_eq!(fx.verifier.comparisons(), 1);
    }

    #[tokio::test]
    async fn test_matches_among_several_keys() {
        let fx = fixture(Some(SECRET));
        issue_key(&fx, 42, "alice", None).await;
        let (raw_key, _) = issue_key(&fx, 42, "alice", None).await;
        issue_key(&fx, 42, "alice", None).await;

        assert_eq!(fx.validator.validate_key(&raw_key).await.unwrap(), "alice");
        assert!(fx.verifier.comparisons() <= 3);
    }

    #[tokio::test]
    async fn test_scan_stops_at_first_match() {
        let fx = fixture(Some(SECRET));
        // The memory store returns candidates in creation order
        let (first, _) = issue_key(&fx, 42, "alice", None).await;
        issue_key(&fx, 42, "alice", None).await;
        let (last, _) = issue_key(&fx, 42, "alice", None).await;

        fx.validator.validate_key(&first).await.unwrap();
        assert_eq!(fx.verifier.comparisons(), 1);

        fx.validator.validate_key(&last).await.unwrap();
        assert_eq!(fx.verifier.comparisons(), 4);
    }

    #[tokio::test]
    async fn test_rejection_compares_every_candidate() {
        let fx = fixture(Some(SECRET));
        let (raw_key, _) = issue_key(&fx, 42, "alice", None).await;
        issue_key(&fx, 42, "alice", None).await;

        let (head, _) = raw_key.rsplit_once('_').unwrap();
        let forged = format!("{}_{}", head, "00".repeat(18));

        assert!(fx.validator.validate_key(&forged).await.is_err());
        assert_eq!(fx.verifier.comparisons(), 2);
    }

    /// Blocks the calling thread for a fixed time, then accepts
    struct SlowVerifier {
        started: AtomicBool,
        delay: std::time::Duration,
    }

    impl KeyVerifier for SlowVerifier {
        fn verify(&self, _raw_key: &str, _hash: &str) -> Result<bool> {
            self.started.store(true, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(true)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_hash_comparison_does_not_stall_worker() {
        let fx = fixture(Some(SECRET));
        let (raw_key, _) = issue_key(&fx, 42, "alice", None).await;

        let slow = Arc::new(SlowVerifier {
            started: AtomicBool::new(false),
            delay: std::time::Duration::from_millis(300),
        });
        let validator = Arc::new(
            ApiKeyValidator::new(
                Some(SECRET),
                Arc::clone(&fx.store) as Arc<dyn CredentialStore>,
                Arc::clone(&fx.cache),
            )
            .with_verifier(Arc::clone(&slow) as Arc<dyn KeyVerifier>),
        );

        let validation = {
            let validator = Arc::clone(&validator);
            tokio::spawn(async move { validator.validate_key(&raw_key).await })
        };

        while !slow.started.load(Ordering::SeqCst) && !validation.is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        // Runs on the only worker while the comparison is in progress
        let spawned_at = Instant::now();
        let latency = tokio::spawn(async move { spawned_at.elapsed() })
            .await
            .unwrap();

        assert!(latency < std::time::Duration::from_millis(100), "{:?}", latency);
        assert!(!validation.is_finished());
        assert_eq!(validation.await.unwrap().unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_format_error_not_authentication() {
        let fx = fixture(Some(SECRET));

        let err = fx.validator.validate_key("not-a-valid-key").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidKeyFormat));
        assert_eq!(err.category(), ErrorCategory::Format);
        assert_eq!(fx.store.find_valid_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_identifier_character() {
        let fx = fixture(Some(SECRET));

        let err = fx.validator.validate_key("subX_ab+c_00ff").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEncoding('+')));
        assert_eq!(fx.store.find_valid_calls(), 0);
    }

    #[tokio::test]
    async fn test_identifier_overflow() {
        let fx = fixture(Some(SECRET));

        let err = fx.validator.validate_key("subX_zzzzzzz_00ff").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decode);
    }

    #[tokio::test]
    async fn test_missing_secret_is_per_request() {
        let fx = fixture(None);

        let err = fx.validator.validate_key("subX_1Pq8Ab_00ff").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingSecret(_)));
        assert_eq!(err.category(), ErrorCategory::Configuration);

        // Format is still checked first
        let err = fx.validator.validate_key("garbage").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[tokio::test]
    async fn test_missing_secret_still_serves_cache() {
        let fx = fixture(None);
        fx.cache.set("subX_1Pq8Ab_00ff", "alice");

        assert_eq!(
            fx.validator.validate_key("subX_1Pq8Ab_00ff").await.unwrap(),
            "alice"
        );
    }

    #[tokio::test]
    async fn test_unknown_key_rejected_without_caching() {
        let fx = fixture(Some(SECRET));
        let (raw_key, _) = issue_key(&fx, 42, "alice", None).await;

        // Same user segment, different random part
        let (head, _) = raw_key.rsplit_once('_').unwrap();
        let forged = format!("{}_{}", head, "00".repeat(18));

        let err = fx.validator.validate_key(&forged).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyRejected));
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(fx.cache.is_empty());
    }

    #[tokio::test]
    async fn test_soft_deleted_key_rejected() {
        let fx = fixture(Some(SECRET));
        let (raw_key, id) = issue_key(&fx, 42, "alice", None).await;
        fx.store.inner().soft_delete(id).await.unwrap();

        let err = fx.validator.validate_key(&raw_key).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyRejected));
    }

    #[tokio::test]
    async fn test_expired_key_rejected() {
        let fx = fixture(Some(SECRET));
        let (raw_key, _) =
            issue_key(&fx, 42, "alice", Some(Utc::now() - Duration::seconds(1))).await;

        let err = fx.validator.validate_key(&raw_key).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyRejected));
    }

    #[tokio::test]
    async fn test_cached_grant_outlives_revocation_until_invalidated() {
        let fx = fixture(Some(SECRET));
        let (raw_key, id) = issue_key(&fx, 42, "alice", None).await;

        fx.validator.validate_key(&raw_key).await.unwrap();
        fx.store.inner().soft_delete(id).await.unwrap();

        // Still cached
        assert_eq!(fx.validator.validate_key(&raw_key).await.unwrap(), "alice");

        fx.cache.invalidate_user("alice");
        assert!(fx.validator.validate_key(&raw_key).await.is_err());
    }

    #[tokio::test]
    async fn test_key_for_other_user_segment_rejected() {
        let fx = fixture(Some(SECRET));
        let (alice_key, _) = issue_key(&fx, 42, "alice", None).await;
        issue_key(&fx, 7, "bob", None).await;

        // Swap in bob's user segment: alice's hash is never consulted
        let codec = IdentifierCodec::new(SECRET);
        let parts = split_api_key(&alice_key).unwrap();
        let swapped = format!("{}_{}_{}", parts.prefix, codec.encode(7), parts.random);

        assert!(matches!(
            fx.validator.validate_key(&swapped).await,
            Err(AuthError::KeyRejected)
        ));
    }

    #[tokio::test]
    async fn test_unreadable_hash_skipped() {
        let fx = fixture(Some(SECRET));
        fx.store
            .inner()
            .create(NewKeyRecord {
                user_id: 42,
                username: "alice".to_string(),
                key_hash: "corrupt".to_string(),
                expires_at: None,
                description: String::new(),
            })
            .await
            .unwrap();
        let (raw_key, _) = issue_key(&fx, 42, "alice", None).await;

        assert_eq!(fx.validator.validate_key(&raw_key).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_provider_name() {
        let fx = fixture(Some(SECRET));
        assert_eq!(fx.validator.name(), "apikey");
    }
}
