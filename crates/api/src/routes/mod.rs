//! API routes

pub mod apikey;
pub mod ops;
pub mod user;

use axum::{Router, middleware};

use crate::auth::require_auth;
use crate::state::AppState;

/// Build the complete API router
///
/// Every route sits behind the auth layer. Whitelisted paths pass through it
/// without an identity.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Operations routes (version - whitelisted)
        .merge(ops::routes())
        // Own API keys
        .nest("/api/v1/apikey", apikey::routes())
        // Caller identity
        .nest("/api/v1/user", user::routes())
        .layer(middleware::from_fn_with_state(
            state.dispatcher.clone(),
            require_auth,
        ))
        .with_state(state)
}
