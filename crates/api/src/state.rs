//! Application state
//!
//! Services are built once at start-up and shared by `Arc`.

use std::sync::Arc;

use sublink_auth::{
    ApiKeyService, ApiKeyValidator, CredentialCache, CredentialStore, JwtValidator, UserDirectory,
};

use crate::auth::AuthDispatcher;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Request authentication
    pub dispatcher: Arc<AuthDispatcher>,
    /// API key lifecycle
    pub api_keys: Arc<ApiKeyService>,
    /// Username to user ID
    pub users: Arc<UserDirectory>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("dispatcher", &self.dispatcher)
            .field("users", &self.users.len())
            .finish()
    }
}

/// Inputs for [`AppState::build`]
pub struct AuthSettings<'a> {
    /// Bearer token signing secret
    pub jwt_secret: &'a [u8],
    /// Identifier codec secret, `None` if not configured
    pub api_key_secret: Option<&'a [u8]>,
}

impl AppState {
    /// Wire validators, dispatcher and key service around a store and cache
    ///
    /// The cache is shared between the validator, which fills it, and the
    /// key service, which clears it on revocation.
    pub fn build(
        settings: AuthSettings<'_>,
        store: Arc<dyn CredentialStore>,
        cache: Arc<CredentialCache>,
        users: Arc<UserDirectory>,
    ) -> Self {
        let api_key_validator = Arc::new(ApiKeyValidator::new(
            settings.api_key_secret,
            Arc::clone(&store),
            Arc::clone(&cache),
        ));
        let jwt_validator = Arc::new(JwtValidator::new(settings.jwt_secret));

        let api_keys = ApiKeyService::new(settings.api_key_secret, store, cache);

        Self {
            dispatcher: Arc::new(AuthDispatcher::new(api_key_validator, jwt_validator)),
            api_keys: Arc::new(api_keys),
            users,
        }
    }

    /// Replace the key service (e.g. one with cheaper hashing in tests)
    #[must_use]
    pub fn with_api_key_service(mut self, service: ApiKeyService) -> Self {
        self.api_keys = Arc::new(service);
        self
    }
}
