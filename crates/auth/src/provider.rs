//! Credential validators
//!
//! [`AuthProvider`] is the seam the request dispatcher calls into. Two
//! implementations exist: [`JwtValidator`] for bearer tokens (here) and
//! `ApiKeyValidator` for API keys.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use crate::claims::{TokenClaims, is_compact_jwt, strip_bearer};
use crate::error::{AuthError, Result};

/// Validates a presented credential and resolves the username
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Validate a credential and return the username it belongs to
    ///
    /// # Errors
    ///
    /// Returns an `AuthError` whose [`category`](AuthError::category) tells
    /// the caller how to respond.
    async fn validate(&self, credential: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Bearer token validator using HMAC-SHA256
///
/// # Example
///
/// ```
/// use sublink_auth::JwtValidator;
///
/// let validator = JwtValidator::new(b"your-secret-key-at-least-32-bytes!");
/// ```
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("algorithm", &"HS256")
            .finish()
    }
}

impl JwtValidator {
    /// Create a validator for tokens signed with `secret`
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validate an `Authorization` header value and return its claims
    pub fn validate_token(&self, header: &str) -> Result<TokenClaims> {
        let token = strip_bearer(header.trim());

        if !is_compact_jwt(token) {
            return Err(AuthError::InvalidTokenFormat);
        }

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("JWT validation failed: {:?}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::InvalidClaims(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl AuthProvider for JwtValidator {
    async fn validate(&self, credential: &str) -> Result<String> {
        self.validate_token(credential).map(|claims| claims.username)
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}
