//! Bearer token issuance

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::claims::TokenClaims;
use crate::error::{AuthError, Result};

/// Signs HS256 bearer tokens with a fixed lifetime
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    expires_in: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer signing with `secret`
    #[must_use]
    pub fn new(secret: &[u8], expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            expires_in,
        }
    }

    /// Sign a token for `username`
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.expires_in.as_secs())
            .map_err(|_| AuthError::InvalidClaims("token lifetime too large".to_string()))?;

        let claims = TokenClaims {
            username: username.to_string(),
            expires_at: now.saturating_add(lifetime),
            issued_at: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidClaims(format!("failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::JwtValidator;
    use crate::test_utils::TEST_SECRET;

    #[test]
    fn test_issue_and_validate() {
        let issuer = TokenIssuer::new(TEST_SECRET, Duration::from_secs(60));
        let token = issuer.issue("alice").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = JwtValidator::new(TEST_SECRET).validate_token(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.expires_at - claims.issued_at, 60);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_other_secret_rejected() {
        let issuer = TokenIssuer::new(b"another-secret-that-is-32-bytes!", Duration::from_secs(60));
        let token = issuer.issue("alice").unwrap();

        let result = JwtValidator::new(TEST_SECRET).validate_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }
}
