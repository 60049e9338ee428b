pub mod auth;
pub mod bus;
pub mod comments;
pub mod error;
pub mod feed;
pub mod posts;
pub mod profiles;
pub mod services;

pub use error::{ApiError, ApiResult};

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::state::AppState;

/// Extract the authenticated user from the session token header.
pub fn get_user_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .get_authenticated_user_id_from_token(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}
