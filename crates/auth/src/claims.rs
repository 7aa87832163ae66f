//! JWT token claims
//!
//! Bearer tokens carry a username plus the standard `iat`/`exp` claims,
//! signed with HS256.

use serde::{Deserialize, Serialize};

/// Prefix stripped from the `Authorization` header value
pub const BEARER_PREFIX: &str = "Bearer ";

/// JWT claims for bearer tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Authenticated username
    pub username: String,

    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,
}

impl TokenClaims {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < chrono::Utc::now().timestamp()
    }
}

/// Remove the `Bearer ` prefix if present
pub fn strip_bearer(header: &str) -> &str {
    header.strip_prefix(BEARER_PREFIX).unwrap_or(header)
}

/// Check for compact JWS shape: exactly three dot-separated segments
pub fn is_compact_jwt(token: &str) -> bool {
    token.split('.').count() == 3
}
