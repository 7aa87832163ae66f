//! Operations routes
//!
//! Version info. Served without authentication.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// Operations routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/version", get(version_handler))
}

/// GET /api/v1/version
async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: "sublink",
        version: env!("CARGO_PKG_VERSION"),
    })
}
