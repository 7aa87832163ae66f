//! Authentication configuration
//!
//! Secrets for bearer tokens and API keys, the validation cache lifetime,
//! and the static user list.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Environment variable consulted when `api_key_secret` is not set
pub const API_KEY_SECRET_ENV: &str = "API_ENCRYPTION_KEY";

/// Minimum length of the bearer token signing secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Authentication configuration
///
/// # Example
///
/// ```toml
/// [auth]
/// jwt_secret = "your-secret-key-at-least-32-characters-long"
/// jwt_expires_in = "12h"
/// api_key_secret = "another-secret"
/// cache_ttl = "5m"
///
/// [[auth.users]]
/// id = 42
/// username = "alice"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret for signing bearer tokens
    /// Must be at least 32 characters
    pub jwt_secret: Option<String>,

    /// Bearer token lifetime
    /// Default: 24 hours
    #[serde(with = "humantime_serde")]
    pub jwt_expires_in: Duration,

    /// Secret for masking user IDs inside API keys
    /// Default: read from `API_ENCRYPTION_KEY`
    pub api_key_secret: Option<String>,

    /// How long a validated API key is cached
    /// Default: 5 minutes
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Known users (username to numeric ID)
    pub users: Vec<UserEntry>,
}

/// One configured user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserEntry {
    pub id: u32,
    pub username: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expires_in: Duration::from_secs(24 * 60 * 60),
            api_key_secret: None,
            cache_ttl: Duration::from_secs(5 * 60),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Get the JWT secret bytes if set
    pub fn jwt_secret_bytes(&self) -> Option<&[u8]> {
        self.jwt_secret.as_ref().map(|s| s.as_bytes())
    }

    /// API key secret from config, falling back to `API_ENCRYPTION_KEY`
    ///
    /// Empty values count as unset.
    pub fn resolved_api_key_secret(&self) -> Option<String> {
        self.api_key_secret
            .clone()
            .or_else(|| std::env::var(API_KEY_SECRET_ENV).ok())
            .filter(|s| !s.is_empty())
    }

    /// Check the fields needed to start serving
    ///
    /// The API key secret is deliberately not required here: without it
    /// bearer tokens still work and API keys fail per request.
    pub fn validate(&self) -> Result<()> {
        let secret = self
            .jwt_secret
            .as_ref()
            .ok_or(ConfigError::missing_field("auth", "jwt_secret"))?;

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::invalid_value(
                "auth",
                "jwt_secret",
                format!("must be at least {} characters", MIN_JWT_SECRET_LEN),
            ));
        }

        if self.jwt_expires_in.is_zero() {
            return Err(ConfigError::invalid_value(
                "auth",
                "jwt_expires_in",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Check the user list for repeated names or IDs
    pub(crate) fn validate_users(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for user in &self.users {
            if user.username.is_empty() {
                return Err(ConfigError::invalid_value(
                    "auth",
                    "users",
                    format!("user {} has an empty username", user.id),
                ));
            }
            if !ids.insert(user.id) {
                return Err(ConfigError::duplicate_user("id", user.id.to_string()));
            }
            if !names.insert(user.username.as_str()) {
                return Err(ConfigError::duplicate_user("username", &user.username));
            }
        }

        Ok(())
    }
}
