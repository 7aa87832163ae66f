//! Credential store
//!
//! [`CredentialStore`] is the persistence seam for key records. Validity
//! (not deleted, not expired) is decided by the store at query time, never
//! cached on the record.
//!
//! [`MemoryKeyStore`] keeps records in process memory behind a `RwLock`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{AuthError, Result};
use crate::key::{KeyRecord, NewKeyRecord};

/// Key record persistence
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new record, returning its ID
    async fn create(&self, record: NewKeyRecord) -> Result<i64>;

    /// Fetch a record by ID, including soft-deleted ones
    async fn get(&self, id: i64) -> Result<Option<KeyRecord>>;

    /// All records of `user_id` that are not soft-deleted and not expired
    async fn find_valid(&self, user_id: u32) -> Result<Vec<KeyRecord>>;

    /// Mark a record deleted
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyNotFound`] if the ID is unknown or already deleted.
    async fn soft_delete(&self, id: i64) -> Result<()>;
}

/// In-memory credential store
///
/// Records are never removed; soft-delete only sets `deleted_at`.
///
/// # Example
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use sublink_auth::{CredentialStore, MemoryKeyStore, NewKeyRecord};
///
/// let store = MemoryKeyStore::new();
/// let id = store
///     .create(NewKeyRecord {
///         user_id: 42,
///         username: "alice".into(),
///         key_hash: "$argon2id$...".into(),
///         expires_at: None,
///         description: String::new(),
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(store.find_valid(42).await.unwrap().len(), 1);
/// store.soft_delete(id).await.unwrap();
/// assert!(store.find_valid(42).await.unwrap().is_empty());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    records: BTreeMap<i64, KeyRecord>,
    next_id: i64,
}

impl MemoryKeyStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records, including soft-deleted ones
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryKeyStore {
    async fn create(&self, record: NewKeyRecord) -> Result<i64> {
        let mut inner = self.inner.write();

        if inner
            .records
            .values()
            .any(|existing| existing.key_hash == record.key_hash)
        {
            return Err(AuthError::store("duplicate key hash"));
        }

        inner.next_id += 1;
        let id = inner.next_id;

        inner.records.insert(
            id,
            KeyRecord {
                id,
                user_id: record.user_id,
                username: record.username,
                key_hash: record.key_hash,
                created_at: Utc::now(),
                expires_at: record.expires_at,
                description: record.description,
                deleted_at: None,
            },
        );

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<KeyRecord>> {
        Ok(self.inner.read().records.get(&id).cloned())
    }

    async fn find_valid(&self, user_id: u32) -> Result<Vec<KeyRecord>> {
        let now = Utc::now();
        let inner = self.inner.read();

        Ok(inner
            .records
            .values()
            .filter(|r| r.user_id == user_id && r.is_valid_at(now))
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.write();

        match inner.records.get_mut(&id) {
            Some(record) if record.deleted_at.is_none() => {
                record.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AuthError::KeyNotFound(id)),
        }
    }
}
