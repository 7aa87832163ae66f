//! API key records and key generation
//!
//! Key format:
//! ```text
//! subX_<base62 masked user id>_<36 hex chars>
//! ```
//!
//! Only the Argon2 hash of the whole key is stored. The raw key is handed
//! back once, from [`generate_api_key`], and cannot be rebuilt afterwards.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::codec::IdentifierCodec;
use crate::error::{AuthError, Result};
use crate::password::{KeyHasher, KeyVerifier};

/// Fixed first segment of every key
pub const KEY_PREFIX: &str = "subX";

/// Segment delimiter
pub const KEY_DELIMITER: char = '_';

/// Bytes of random material in the last segment
pub const KEY_RANDOM_BYTES: usize = 18;

/// Stored record backing an issued API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// Record ID assigned by the store
    pub id: i64,
    /// Owning user ID
    pub user_id: u32,
    /// Owning username (denormalized)
    pub username: String,
    /// Argon2 PHC hash of the raw key
    pub key_hash: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time (`None` = never)
    pub expires_at: Option<DateTime<Utc>>,
    /// Free-text note
    pub description: String,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl KeyRecord {
    /// Check if the record is usable at `now`
    ///
    /// Not soft-deleted and either no expiry or expiry in the future.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && self.expires_at.is_none_or(|exp| exp > now)
    }

    /// Compare a raw key against the stored hash
    pub fn verify(&self, verifier: &dyn KeyVerifier, raw_key: &str) -> Result<bool> {
        verifier.verify(raw_key, &self.key_hash)
    }
}

/// Record fields supplied by the caller of `CredentialStore::create`
#[derive(Debug, Clone)]
pub struct NewKeyRecord {
    pub user_id: u32,
    pub username: String,
    pub key_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub description: String,
}

/// Freshly generated key: the raw key plus the record to persist
#[derive(Debug)]
pub struct GeneratedKey {
    /// Raw key (show once, never store)
    pub raw_key: String,
    /// Record carrying only the hash
    pub record: NewKeyRecord,
}

/// Borrowed segments of a raw key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub prefix: &'a str,
    pub encoded_id: &'a str,
    pub random: &'a str,
}

/// Split a raw key into its three segments
///
/// # Errors
///
/// Returns [`AuthError::InvalidKeyFormat`] unless there are exactly three
/// segments.
pub fn split_api_key(raw_key: &str) -> Result<KeyParts<'_>> {
    let mut segments = raw_key.split(KEY_DELIMITER);

    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(prefix), Some(encoded_id), Some(random), None) => Ok(KeyParts {
            prefix,
            encoded_id,
            random,
        }),
        _ => Err(AuthError::InvalidKeyFormat),
    }
}

/// Generate a new key for a user
///
/// # Example
///
/// ```
/// use sublink_auth::{IdentifierCodec, generate_api_key, split_api_key};
/// use sublink_auth::password::KeyHasher;
///
/// let codec = IdentifierCodec::new(b"s3cret");
/// let key = generate_api_key(&codec, &KeyHasher::new(), 42, "alice", "ci", None).unwrap();
///
/// let parts = split_api_key(&key.raw_key).unwrap();
/// assert_eq!(parts.prefix, "subX");
/// assert_eq!(codec.decode(parts.encoded_id).unwrap(), 42);
/// ```
pub fn generate_api_key(
    codec: &IdentifierCodec,
    hasher: &KeyHasher,
    user_id: u32,
    username: &str,
    description: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<GeneratedKey> {
    let random_bytes: [u8; KEY_RANDOM_BYTES] = rand::rng().random();

    let raw_key = format!(
        "{}{}{}{}{}",
        KEY_PREFIX,
        KEY_DELIMITER,
        codec.encode(user_id),
        KEY_DELIMITER,
        hex::encode(random_bytes)
    );

    let key_hash = hasher.hash(&raw_key)?;

    Ok(GeneratedKey {
        raw_key,
        record: NewKeyRecord {
            user_id,
            username: username.to_string(),
            key_hash,
            expires_at,
            description: description.to_string(),
        },
    })
}
