//! Sublink API
//!
//! HTTP surface of the authentication core, built on Axum.
//!
//! # Usage
//!
//! ```ignore
//! use sublink_api::{build_router, AppState, AuthSettings};
//!
//! let state = AppState::build(
//!     AuthSettings { jwt_secret, api_key_secret },
//!     store,
//!     cache,
//!     users,
//! );
//!
//! let app = build_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! # Endpoints
//!
//! ## Public
//! - `GET /api/v1/version` - Service name and version
//!
//! ## API keys
//! - `POST /api/v1/apikey/add` - Create a key, returned once
//! - `GET /api/v1/apikey/get` - List own valid keys
//! - `DELETE /api/v1/apikey/delete/{id}` - Revoke own key
//!
//! ## User
//! - `GET /api/v1/user/info` - Caller identity
//!
//! # Authentication
//!
//! Send either `X-API-Key: subX_...` or `Authorization: Bearer <jwt>`.
//! See [`auth::middleware`] for the dispatch rules and status codes.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

// Re-exports
pub use auth::{AuthDispatcher, AuthUser, require_auth};
pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::{AppState, AuthSettings};
