//! Current user endpoint
//!
//! - `GET /api/v1/user/info` - Identity of the caller

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use sublink_auth::AuthMethod;

use crate::auth::AuthUser;
use crate::state::AppState;

/// Caller identity
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    pub username: String,
    pub method: AuthMethod,
    /// `None` when the name is not in the user directory
    pub user_id: Option<u32>,
}

/// User routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/info", get(user_info))
}

/// GET /api/v1/user/info
async fn user_info(user: AuthUser, State(state): State<AppState>) -> Json<UserInfoResponse> {
    let user_id = state.users.find(&user.username).map(|u| u.id);

    Json(UserInfoResponse {
        username: user.0.username,
        method: user.0.method,
        user_id,
    })
}
