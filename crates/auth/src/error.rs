//! Authentication error types

use std::fmt;

use thiserror::Error;

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Coarse error category
///
/// Validators return a specific [`AuthError`]; callers that only need to
/// decide how to respond (status code, log level) match on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Required secret material is not configured
    Configuration,
    /// Malformed key or token structure
    Format,
    /// Encoded identifier does not fit in 32 bits
    Decode,
    /// Credential did not verify
    Authentication,
    /// Backing store failure
    Internal,
}

impl ErrorCategory {
    /// Stable lowercase name, used as a log field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Format => "format",
            Self::Decode => "decode",
            Self::Authentication => "authentication",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during authentication operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// A secret needed for this operation is not configured
    #[error("missing secret: {0}")]
    MissingSecret(&'static str),

    /// API key is not `<prefix>_<id>_<random>`
    #[error("invalid API key format")]
    InvalidKeyFormat,

    /// Encoded identifier contains a character outside the base-62 alphabet
    #[error("invalid base62 character: {0:?}")]
    InvalidEncoding(char),

    /// Encoded identifier decodes to more than 4 bytes
    #[error("decoded identifier exceeds 4 bytes")]
    IdentifierOverflow,

    /// No valid key record matched the presented API key
    #[error("API key rejected")]
    KeyRejected,

    /// Bearer token does not have three dot-separated segments
    #[error("invalid token format")]
    InvalidTokenFormat,

    /// JWT signature verification failed
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token claims are invalid
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    /// Key record not found
    #[error("key {0} not found")]
    KeyNotFound(i64),

    /// Password hashing failed
    #[error("password hash error: {0}")]
    HashError(String),

    /// Credential store operation failed
    #[error("store error: {0}")]
    StoreError(String),

    /// Blocking hash comparison task panicked or was cancelled
    #[error("key verification task failed: {0}")]
    VerifyTask(String),
}

impl AuthError {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingSecret(_) => ErrorCategory::Configuration,
            Self::InvalidKeyFormat | Self::InvalidEncoding(_) | Self::InvalidTokenFormat => {
                ErrorCategory::Format
            }
            Self::IdentifierOverflow => ErrorCategory::Decode,
            Self::KeyRejected
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::InvalidClaims(_) => ErrorCategory::Authentication,
            Self::KeyNotFound(_)
            | Self::HashError(_)
            | Self::StoreError(_)
            | Self::VerifyTask(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Create a StoreError
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            AuthError::MissingSecret("api_key_secret").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(AuthError::InvalidKeyFormat.category(), ErrorCategory::Format);
        assert_eq!(
            AuthError::InvalidEncoding('-').category(),
            ErrorCategory::Format
        );
        assert_eq!(
            AuthError::IdentifierOverflow.category(),
            ErrorCategory::Decode
        );
        assert_eq!(
            AuthError::KeyRejected.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::InvalidSignature.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::store("connection refused").category(),
            ErrorCategory::Internal
        );
        assert_eq!(
            AuthError::VerifyTask("panicked".to_string()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_messages() {
        let err = AuthError::InvalidEncoding('!');
        assert!(err.to_string().contains("'!'"));

        let err = AuthError::IdentifierOverflow;
        assert!(err.to_string().contains("4 bytes"));

        let err = AuthError::MissingSecret("api_key_secret");
        assert!(err.to_string().contains("api_key_secret"));
    }

    #[test]
    fn test_category_as_str() {
        assert_eq!(ErrorCategory::Configuration.as_str(), "configuration");
        assert_eq!(ErrorCategory::Decode.to_string(), "decode");
    }
}
