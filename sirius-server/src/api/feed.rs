use axum::{extract::State, http::HeaderMap, Json};

use sirius_types::FeedPost;

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::feed::load_feed;
use crate::state::AppState;

/// GET /feed - Newest-first posts with resolved authors, media, true counts
/// and the viewer's liked flags. Authentication is optional here; anonymous
/// viewers just get `liked_by_me: false` everywhere.
pub async fn get_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<FeedPost>>> {
    let viewer = get_user_from_headers(&state, &headers).ok();

    let feed = load_feed(&state.db.pool, viewer)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(feed))
}
