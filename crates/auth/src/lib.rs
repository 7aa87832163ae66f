//! Sublink - Authentication
//!
//! API key and bearer token validation for the sublink HTTP API.
//!
//! # Two Credential Types
//!
//! ## API Keys (`X-API-Key`)
//!
//! Long-lived keys issued per user:
//! ```text
//! subX_1Pq8Ab_3f9c0e...
//! ```
//! - Middle segment is the owner's user ID, masked and base62-encoded
//! - Stored as Argon2 hashes, never in the clear
//! - Successful validations are cached for five minutes
//!
//! ## Bearer Tokens (`Authorization`)
//!
//! HS256 JWTs carrying `username`, `exp` and `iat`:
//! ```text
//! Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...
//! ```
//! - Stateless, checked against the shared signing secret

mod apikey_provider;
mod cache;
mod claims;
mod codec;
mod error;
mod issuer;
mod key;
pub mod password;
mod provider;
mod service;
mod store;
mod user;

/// Test utilities for tokens and stores
pub mod test_utils;


pub use error::{AuthError, ErrorCategory, Result};

// Identifier obfuscation
pub use codec::{IdentifierCodec, decode_user_id, encode_user_id};

// Key records and storage
pub use key::{
    GeneratedKey, KEY_PREFIX, KeyParts, KeyRecord, NewKeyRecord, generate_api_key, split_api_key,
};
pub use store::{CredentialStore, MemoryKeyStore};

// Validation cache
pub use cache::{CacheSweeper, CredentialCache, DEFAULT_CACHE_TTL, SWEEP_EVERY};

// Bearer tokens
pub use claims::{BEARER_PREFIX, TokenClaims};
pub use issuer::TokenIssuer;

// Auth providers
pub use apikey_provider::ApiKeyValidator;
pub use provider::{AuthProvider, JwtValidator};

// Key management
pub use service::{ApiKeyService, CreatedKey};

// Identities
pub use user::{AuthMethod, Identity, User, UserDirectory};
