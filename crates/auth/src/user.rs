//! Users and authenticated identities

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A known user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric ID, the value encoded into API keys
    pub id: u32,
    /// Unique username
    pub username: String,
}

/// How a request proved its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// `X-API-Key` header
    ApiKey,
    /// `Authorization: Bearer` header
    BearerToken,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::BearerToken => "bearer_token",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity attached to an authenticated request
///
/// Only present on requests that passed authentication; whitelisted
/// requests carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    pub method: AuthMethod,
}

impl Identity {
    pub fn new(username: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            username: username.into(),
            method,
        }
    }
}

/// In-memory username directory
///
/// Resolves the username carried by a request to the numeric ID needed to
/// issue keys.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, u32>>,
}

impl UserDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of users
    ///
    /// Later entries win on duplicate usernames.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        directory
    }

    /// Add or replace a user
    pub fn insert(&self, user: User) {
        self.users.write().insert(user.username, user.id);
    }

    /// Look up a user by name
    pub fn find(&self, username: &str) -> Option<User> {
        self.users.read().get(username).map(|&id| User {
            id,
            username: username.to_string(),
        })
    }

    /// Number of users
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Check if the directory is empty
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}
