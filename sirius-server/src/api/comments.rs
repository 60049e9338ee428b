use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

use sirius_types::{Comment, CommentCreatedResponse, CommentView, CreateCommentRequest};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{CommentRepository, PostRepository};
use crate::feed::format_relative;
use crate::profile::{display_alias, ProfileResolver};
use crate::state::AppState;

const THREAD_PREVIEW_LIMIT: i64 = 10;

/// POST /posts/:id/comments - Add a comment.
///
/// The response carries the stored comment with the author's display name
/// and relative timestamp, plus the recounted comment total, so a client
/// can prepend it without refetching the thread.
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<Json<CommentCreatedResponse>> {
    let author_id = get_user_from_headers(&state, &headers)?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest(
            "Comment cannot be empty".to_string(),
        ));
    }

    let post_repo = PostRepository::new(state.db.pool.clone());
    let comment_repo = CommentRepository::new(state.db.pool.clone());
    let resolver = ProfileResolver::new(state.db.pool.clone());

    if post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        author_id,
        content,
        created_at: Utc::now(),
    };
    comment_repo
        .create(&comment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let comments = comment_repo
        .count_for_post(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if let Err(e) = post_repo.refresh_counters(&post_id) {
        tracing::warn!("Failed to refresh counters for post {}: {}", post_id, e);
    }

    let profiles = resolver
        .resolve(&[author_id])
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let view = CommentView {
        id: comment.id,
        author: display_alias(profiles.get(&author_id), &author_id),
        timestamp: format_relative(comment.created_at, Utc::now()),
        content: comment.content,
    };

    Ok(Json(CommentCreatedResponse {
        comment: view,
        comments,
    }))
}

/// GET /posts/:id/comments - Newest comments with resolved author names
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let post_repo = PostRepository::new(state.db.pool.clone());
    let comment_repo = CommentRepository::new(state.db.pool.clone());
    let resolver = ProfileResolver::new(state.db.pool.clone());

    if post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let comments = comment_repo
        .recent_for_post(&post_id, THREAD_PREVIEW_LIMIT)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let author_ids: Vec<Uuid> = {
        let distinct: HashSet<Uuid> = comments.iter().map(|c| c.author_id).collect();
        distinct.into_iter().collect()
    };
    let profiles = resolver.resolve(&author_ids).unwrap_or_else(|e| {
        tracing::warn!("Profile resolution failed, using aliases: {}", e);
        Default::default()
    });

    let now = Utc::now();
    let views = comments
        .into_iter()
        .map(|c| CommentView {
            id: c.id,
            author: display_alias(profiles.get(&c.author_id), &c.author_id),
            timestamp: format_relative(c.created_at, now),
            content: c.content,
        })
        .collect();

    Ok(Json(views))
}
