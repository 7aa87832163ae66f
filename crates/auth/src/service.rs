//! API key management service
//!
//! Orchestrates key lifecycle: generation, listing, and revocation. Revoking
//! a key also clears the owner's cached grants, so the TTL window does not
//! apply to revocations made here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::cache::CredentialCache;
use crate::codec::IdentifierCodec;
use crate::error::{AuthError, Result};
use crate::key::{KeyRecord, generate_api_key};
use crate::password::KeyHasher;
use crate::store::CredentialStore;
use crate::user::User;

/// A newly created key
///
/// `raw_key` is only available here; the store keeps just the hash.
#[derive(Debug, Clone)]
pub struct CreatedKey {
    pub id: i64,
    pub raw_key: String,
}

/// Key lifecycle operations
pub struct ApiKeyService {
    codec: Option<IdentifierCodec>,
    hasher: KeyHasher,
    store: Arc<dyn CredentialStore>,
    cache: Arc<CredentialCache>,
}

impl std::fmt::Debug for ApiKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyService")
            .field("has_secret", &self.codec.is_some())
            .finish()
    }
}

impl ApiKeyService {
    /// Create a service sharing the validator's store and cache
    pub fn new(
        secret: Option<&[u8]>,
        store: Arc<dyn CredentialStore>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self {
            codec: secret.map(IdentifierCodec::new),
            hasher: KeyHasher::new(),
            store,
            cache,
        }
    }

    /// Use a custom hasher for new keys
    #[must_use]
    pub fn with_hasher(mut self, hasher: KeyHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Generate and persist a key for `user`
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingSecret`] if no identifier secret is configured.
    pub async fn create_key(
        &self,
        user: &User,
        description: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CreatedKey> {
        let codec = self
            .codec
            .as_ref()
            .ok_or(AuthError::MissingSecret("api_key_secret"))?;

        let generated = generate_api_key(
            codec,
            &self.hasher,
            user.id,
            &user.username,
            description,
            expires_at,
        )?;

        let id = self.store.create(generated.record).await?;

        info!(user = %user.username, key_id = id, "API key created");

        Ok(CreatedKey {
            id,
            raw_key: generated.raw_key,
        })
    }

    /// Valid keys of a user
    pub async fn list_keys(&self, user_id: u32) -> Result<Vec<KeyRecord>> {
        self.store.find_valid(user_id).await
    }

    /// Soft-delete a key owned by `owner` and drop the owner's cached grants
    ///
    /// A key owned by someone else reports as not found.
    pub async fn revoke_key(&self, id: i64, owner: &User) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .filter(|r| r.user_id == owner.id && r.deleted_at.is_none())
            .ok_or(AuthError::KeyNotFound(id))?;

        self.store.soft_delete(record.id).await?;
        self.cache.invalidate_user(&record.username);

        info!(user = %record.username, key_id = id, "API key revoked");
        Ok(())
    }
}
