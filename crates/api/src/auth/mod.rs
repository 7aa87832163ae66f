//! Authentication module
//!
//! # Usage
//!
//! ```ignore
//! use sublink_api::auth::{AuthDispatcher, AuthUser, require_auth};
//!
//! // Layer the dispatcher over the router
//! router.layer(middleware::from_fn_with_state(dispatcher, require_auth))
//!
//! // Read the identity in handlers
//! async fn me(user: AuthUser) -> impl IntoResponse { }
//! ```

pub mod extractors;
pub mod middleware;

pub use extractors::AuthUser;
pub use middleware::{
    API_KEY_HEADER, AuthDispatcher, AuthOutcome, AuthRejection, MAX_CREDENTIAL_SIZE,
    PUBLIC_PATH_PREFIXES, is_public_path, require_auth,
};

// Re-export core types from sublink-auth
pub use sublink_auth::{AuthMethod, AuthProvider, Identity};
