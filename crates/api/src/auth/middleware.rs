//! Request authentication middleware
//!
//! Every request passes through [`AuthDispatcher::authenticate`] once:
//!
//! 1. Whitelisted path → pass through, no identity
//! 2. `X-API-Key` present → API key validator
//! 3. Otherwise `Authorization` is required → bearer token validator
//!
//! On success the [`Identity`] is inserted into the request extensions for
//! handlers to pick up with [`AuthUser`](super::AuthUser). Rejections end the
//! request with a JSON error body and never reach a handler.
//!
//! # Setup
//!
//! ```ignore
//! let dispatcher = Arc::new(AuthDispatcher::new(api_key_validator, jwt_validator));
//!
//! Router::new()
//!     .route("/api/v1/thing", get(handler))
//!     .layer(middleware::from_fn_with_state(dispatcher, require_auth))
//! ```

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use sublink_auth::{AuthError, AuthMethod, AuthProvider, ErrorCategory, Identity};

/// Maximum credential header size (8KB) - prevents memory exhaustion attacks
pub const MAX_CREDENTIAL_SIZE: usize = 8 * 1024;

/// API key header
pub const API_KEY_HEADER: &str = "x-api-key";

/// Path prefixes served without authentication
///
/// The root path `/` is also public but only as an exact match.
pub const PUBLIC_PATH_PREFIXES: [&str; 5] = [
    "/static",
    "/api/v1/auth/login",
    "/api/v1/auth/captcha",
    "/c/", // Short links
    "/api/v1/version",
];

/// Public paths that don't require authentication
pub fn is_public_path(path: &str) -> bool {
    path == "/" || PUBLIC_PATH_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Why a request was turned away
#[derive(Debug)]
pub enum AuthRejection {
    /// Neither `X-API-Key` nor `Authorization` was sent
    MissingCredential,
    /// The API key failed validation
    ApiKey(AuthError),
    /// The bearer token failed validation
    Token(AuthError),
}

impl AuthRejection {
    /// Get the HTTP status code for this rejection
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential => StatusCode::BAD_REQUEST,
            Self::ApiKey(e) => match e.category() {
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Token(e) => match e.category() {
                ErrorCategory::Format => StatusCode::BAD_REQUEST,
                ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "AUTH_REQUIRED",
            Self::ApiKey(e) if e.category() == ErrorCategory::Internal => "INTERNAL_ERROR",
            Self::ApiKey(_) => "INVALID_API_KEY",
            Self::Token(AuthError::TokenExpired) => "TOKEN_EXPIRED",
            Self::Token(e) if e.category() == ErrorCategory::Format => "MALFORMED_TOKEN",
            Self::Token(e) if e.category() == ErrorCategory::Authentication => "INVALID_TOKEN",
            Self::Token(_) => "INTERNAL_ERROR",
        }
    }

    /// Generic client-facing message
    pub fn message(&self) -> &'static str {
        match self.code() {
            "AUTH_REQUIRED" => "Authorization header required",
            "INVALID_API_KEY" => "Invalid API key",
            "TOKEN_EXPIRED" => "Authentication token has expired",
            "MALFORMED_TOKEN" => "Malformed authentication token",
            "INVALID_TOKEN" => "Invalid authentication token",
            _ => "Internal server error",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.message(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

/// Result of authenticating one request
#[derive(Debug)]
pub enum AuthOutcome {
    /// Whitelisted path, no identity attached
    Bypassed,
    /// Credential accepted
    Authenticated(Identity),
    /// Credential missing or refused
    Rejected(AuthRejection),
}

/// Chooses a validator per request and turns its verdict into an outcome
pub struct AuthDispatcher {
    api_keys: Arc<dyn AuthProvider>,
    tokens: Arc<dyn AuthProvider>,
}

impl std::fmt::Debug for AuthDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthDispatcher")
            .field("api_keys", &self.api_keys.name())
            .field("tokens", &self.tokens.name())
            .finish()
    }
}

impl AuthDispatcher {
    /// Create a dispatcher from an API key validator and a token validator
    pub fn new(api_keys: Arc<dyn AuthProvider>, tokens: Arc<dyn AuthProvider>) -> Self {
        Self { api_keys, tokens }
    }

    /// Authenticate a request by path and headers
    pub async fn authenticate(&self, path: &str, headers: &HeaderMap) -> AuthOutcome {
        if is_public_path(path) {
            return AuthOutcome::Bypassed;
        }

        match credential(headers, API_KEY_HEADER) {
            Credential::Present(key) => {
                return self
                    .run(path, self.api_keys.as_ref(), key, AuthMethod::ApiKey)
                    .await;
            }
            Credential::Unreadable => {
                return self.reject(path, AuthRejection::ApiKey(AuthError::InvalidKeyFormat));
            }
            Credential::Absent => {}
        }

        match credential(headers, AUTHORIZATION.as_str()) {
            Credential::Present(header) => {
                self.run(path, self.tokens.as_ref(), header, AuthMethod::BearerToken)
                    .await
            }
            Credential::Unreadable => {
                self.reject(path, AuthRejection::Token(AuthError::InvalidTokenFormat))
            }
            Credential::Absent => self.reject(path, AuthRejection::MissingCredential),
        }
    }

    async fn run(
        &self,
        path: &str,
        provider: &dyn AuthProvider,
        credential: &str,
        method: AuthMethod,
    ) -> AuthOutcome {
        match provider.validate(credential).await {
            Ok(username) => {
                debug!(user = %username, method = %method, path, "Request authenticated");
                AuthOutcome::Authenticated(Identity::new(username, method))
            }
            Err(e) => {
                let rejection = match method {
                    AuthMethod::ApiKey => AuthRejection::ApiKey(e),
                    AuthMethod::BearerToken => AuthRejection::Token(e),
                };
                self.reject(path, rejection)
            }
        }
    }

    fn reject(&self, path: &str, rejection: AuthRejection) -> AuthOutcome {
        match &rejection {
            AuthRejection::MissingCredential => {
                warn!(path, "Request without credentials rejected");
            }
            AuthRejection::ApiKey(e) | AuthRejection::Token(e) => {
                warn!(
                    path,
                    category = %e.category(),
                    error = %e,
                    status = %rejection.status_code(),
                    "Credential rejected"
                );
            }
        }
        AuthOutcome::Rejected(rejection)
    }
}

enum Credential<'a> {
    Absent,
    Present(&'a str),
    /// Oversized or not visible ASCII
    Unreadable,
}

fn credential<'a>(headers: &'a HeaderMap, name: &str) -> Credential<'a> {
    let Some(value) = headers.get(name) else {
        return Credential::Absent;
    };

    if value.len() > MAX_CREDENTIAL_SIZE {
        return Credential::Unreadable;
    }

    match value.to_str() {
        Ok(s) if s.trim().is_empty() => Credential::Absent,
        Ok(s) => Credential::Present(s.trim()),
        Err(_) => Credential::Unreadable,
    }
}

/// Axum middleware running the dispatcher
///
/// Use with `middleware::from_fn_with_state`.
pub async fn require_auth(
    State(dispatcher): State<Arc<AuthDispatcher>>,
    mut request: Request,
    next: Next,
) -> Response {
    match dispatcher
        .authenticate(request.uri().path(), request.headers())
        .await
    {
        AuthOutcome::Bypassed => next.run(request).await,
        AuthOutcome::Authenticated(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        AuthOutcome::Rejected(rejection) => rejection.into_response(),
    }
}
