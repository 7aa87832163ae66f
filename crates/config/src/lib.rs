//! Sublink Configuration
//!
//! TOML-based configuration with defaults for everything except the token
//! signing secret.
//!
//! # Parsing
//!
//! ```
//! use sublink_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 9000").unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! port = 8000
//!
//! [auth]
//! jwt_secret = "change-me-to-at-least-32-characters!"
//! api_key_secret = "s3cret"
//!
//! [[auth.users]]
//! id = 42
//! username = "alice"
//!
//! [log]
//! level = "debug"
//! ```

mod auth;
mod error;
mod logging;
mod server;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use auth::{API_KEY_SECRET_ENV, AuthConfig, MIN_JWT_SECRET_LEN, UserEntry};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::ServerConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// Secrets, cache lifetime and users
    pub auth: AuthConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that hold for any command
    ///
    /// Secrets are checked by [`AuthConfig::validate`] when serving, so a
    /// config without `jwt_secret` still parses.
    fn validate(&self) -> Result<()> {
        if self.auth.cache_ttl.is_zero() {
            return Err(ConfigError::invalid_value(
                "auth",
                "cache_ttl",
                "must be greater than zero",
            ));
        }
        self.auth.validate_users()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.auth.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080

[auth]
jwt_secret = "change-me-to-at-least-32-characters!"
jwt_expires_in = "1h"
api_key_secret = "s3cret"
cache_ttl = "10m"

[[auth.users]]
id = 42
username = "alice"

[[auth.users]]
id = 7
username = "bob"

[log]
level = "debug"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.auth.jwt_expires_in, Duration::from_secs(3600));
        assert_eq!(config.auth.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.auth.users.len(), 2);
        assert!(config.auth.validate().is_ok());
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_jwt_secret_still_parses() {
        let config = Config::from_str("[server]\nport = 1").unwrap();
        assert!(config.auth.validate().is_err());
    }

    #[test]
    fn test_zero_cache_ttl_rejected() {
        let result = Config::from_str("[auth]\ncache_ttl = \"0s\"");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "cache_ttl", .. })
        ));
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let toml = r#"
[[auth.users]]
id = 1
username = "alice"

[[auth.users]]
id = 2
username = "alice"
"#;
        assert!(matches!(
            Config::from_str(toml),
            Err(ConfigError::DuplicateUser { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/sublink.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
