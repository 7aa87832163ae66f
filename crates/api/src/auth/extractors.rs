//! Identity extractors
//!
//! Handlers never read credentials themselves. They take [`AuthUser`], which
//! reads the [`Identity`] left by [`require_auth`](super::require_auth) and
//! fails closed when there is none.

use axum::{extract::FromRequestParts, http::request::Parts};

use sublink_auth::Identity;

use crate::error::ApiError;

/// Authenticated user extractor
///
/// Rejects with 401 if the request carries no identity, which is the case
/// for whitelisted paths and for routers built without the auth layer.
///
/// # Example
///
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl std::ops::Deref for AuthUser {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}
