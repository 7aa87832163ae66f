//! API key management endpoints
//!
//! Callers manage their own keys. The raw key is returned once, on creation.
//!
//! # Routes
//!
//! - `POST /api/v1/apikey/add` - Create an API key
//! - `GET /api/v1/apikey/get` - List own valid API keys
//! - `DELETE /api/v1/apikey/delete/{id}` - Revoke own API key

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use sublink_auth::{KeyRecord, User};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted description
const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// Request/Response types
// =============================================================================

/// Create API key request
#[derive(Debug, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub description: String,
    /// When the key expires (None = never)
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// API key response (never includes the key or its hash)
#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: i64,
    pub description: String,
    pub created_at: String,
    pub expires_at: Option<String>,
}

impl From<KeyRecord> for ApiKeyResponse {
    fn from(record: KeyRecord) -> Self {
        Self {
            id: record.id,
            description: record.description,
            created_at: record.created_at.to_rfc3339(),
            expires_at: record.expires_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Create API key response (includes the key ONCE)
#[derive(Debug, Serialize)]
pub struct CreateApiKeyResponse {
    pub id: i64,
    /// The actual API key (only shown once!)
    pub key: String,
    pub description: String,
    pub expires_at: Option<String>,
}

/// List API keys response
#[derive(Debug, Serialize)]
pub struct ListApiKeysResponse {
    pub api_keys: Vec<ApiKeyResponse>,
    pub count: usize,
}

// =============================================================================
// Routes
// =============================================================================

/// API key routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(create_api_key))
        .route("/get", get(list_api_keys))
        .route("/delete/{id}", delete(revoke_api_key))
}

/// Resolve the caller to a directory user
fn resolve_user(state: &AppState, user: &AuthUser) -> Result<User, ApiError> {
    state
        .users
        .find(&user.username)
        .ok_or_else(|| ApiError::forbidden(format!("user '{}' cannot own API keys", user.username)))
}

/// Create a new API key for the caller
///
/// POST /api/v1/apikey/add
async fn create_api_key(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateApiKeyResponse>), ApiError> {
    let owner = resolve_user(&state, &user)?;
    let Json(req) = payload?;

    if req.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::validation(
            "description",
            format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
        ));
    }

    if let Some(expires) = req.expires_at
        && expires <= Utc::now()
    {
        return Err(ApiError::validation("expires_at", "must be in the future"));
    }

    let created = state
        .api_keys
        .create_key(&owner, &req.description, req.expires_at)
        .await?;

    info!(user = %owner.username, key_id = created.id, method = %user.method, "API key issued via HTTP");

    Ok((
        StatusCode::CREATED,
        Json(CreateApiKeyResponse {
            id: created.id,
            key: created.raw_key,
            description: req.description,
            expires_at: req.expires_at.map(|dt| dt.to_rfc3339()),
        }),
    ))
}

/// List the caller's valid API keys
///
/// GET /api/v1/apikey/get
async fn list_api_keys(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListApiKeysResponse>, ApiError> {
    let owner = resolve_user(&state, &user)?;

    let keys = state.api_keys.list_keys(owner.id).await?;

    let count = keys.len();
    Ok(Json(ListApiKeysResponse {
        api_keys: keys.into_iter().map(ApiKeyResponse::from).collect(),
        count,
    }))
}

/// Revoke one of the caller's API keys
///
/// DELETE /api/v1/apikey/delete/{id}
async fn revoke_api_key(
    user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let owner = resolve_user(&state, &user)?;
    let Path(id) = id?;

    state.api_keys.revoke_key(id, &owner).await?;

    Ok(StatusCode::NO_CONTENT)
}
