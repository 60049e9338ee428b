use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use sirius_types::{AspectRatio, CreatePostRequest, LikeToggleResponse, Post, PostMedia};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{LikeRepository, MediaRepository, PostRepository};
use crate::media::{crop_to_aspect, CropSpec};
use crate::state::AppState;

const MAX_POST_CHARS: usize = 2000;

/// POST /posts - Create a new post
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    let author_id = get_user_from_headers(&state, &headers)?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest(
            "Post content cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Post content exceeds {} character limit",
            MAX_POST_CHARS
        )));
    }

    let post = Post {
        id: Uuid::new_v4(),
        author_id,
        content,
        created_at: Utc::now(),
        likes_count: 0,
        comments_count: 0,
    };

    let post_repo = PostRepository::new(state.db.pool.clone());
    post_repo
        .create(&post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(post))
}

/// DELETE /posts/:id - Author-only. Child rows go with the schema cascade;
/// stored media files are removed here because the database cannot reach
/// the filesystem.
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let post_repo = PostRepository::new(state.db.pool.clone());
    let media_repo = MediaRepository::new(state.db.pool.clone());

    let post = post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author can delete a post".to_string(),
        ));
    }

    let media = media_repo
        .for_post(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    post_repo
        .delete(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // Application-level file cascade; a missing file is not worth failing over
    for item in &media {
        if let Err(e) = tokio::fs::remove_file(&item.storage_path).await {
            tracing::warn!("Failed to remove media file {}: {}", item.storage_path, e);
        }
    }

    Ok(Json(serde_json::json!({
        "message": "Post deleted"
    })))
}

/// POST /posts/:id/like - Toggle the viewer's like.
///
/// The repository does an atomic delete-then-insert-or-ignore, so two
/// concurrent toggles cannot corrupt state; the response carries the
/// recounted total, not the denormalized column.
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<LikeToggleResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let post_repo = PostRepository::new(state.db.pool.clone());
    let like_repo = LikeRepository::new(state.db.pool.clone());

    if post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let liked = like_repo
        .toggle(&post_id, &user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let likes = like_repo
        .count_for_post(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // Keep the denormalized column roughly current; reads never trust it
    if let Err(e) = post_repo.refresh_counters(&post_id) {
        tracing::warn!("Failed to refresh counters for post {}: {}", post_id, e);
    }

    Ok(Json(LikeToggleResponse {
        post_id,
        liked,
        likes,
    }))
}

struct UploadForm {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
    spec: CropSpec,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut bytes = None;
    let mut file_name = String::from("upload");
    let mut mime_type = String::from("application/octet-stream");
    let mut aspect = AspectRatio::default();
    let mut zoom = 1.0f64;
    let mut offset_x = 0.5f64;
    let mut offset_y = 0.5f64;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if let Some(fname) = field.file_name() {
                    file_name = fname.to_string();
                }
                if let Some(ct) = field.content_type() {
                    mime_type = ct.to_string();
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            "aspect" => {
                let text = field.text().await.unwrap_or_default();
                aspect = AspectRatio::parse(&text).ok_or_else(|| {
                    ApiError::BadRequest(format!("Unknown aspect ratio '{}'", text))
                })?;
            }
            "zoom" => {
                let text = field.text().await.unwrap_or_default();
                zoom = text
                    .parse()
                    .map_err(|_| ApiError::BadRequest("Invalid zoom value".to_string()))?;
            }
            "offset_x" => {
                let text = field.text().await.unwrap_or_default();
                offset_x = text
                    .parse()
                    .map_err(|_| ApiError::BadRequest("Invalid offset_x value".to_string()))?;
            }
            "offset_y" => {
                let text = field.text().await.unwrap_or_default();
                offset_y = text
                    .parse()
                    .map_err(|_| ApiError::BadRequest("Invalid offset_y value".to_string()))?;
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    Ok(UploadForm {
        bytes,
        file_name,
        mime_type,
        spec: CropSpec {
            aspect,
            zoom,
            offset_x,
            offset_y,
        },
    })
}

fn extension_for(mime_type: &str, file_name: &str) -> String {
    match mime_type {
        "image/png" => "png".to_string(),
        "image/gif" => "gif".to_string(),
        "image/webp" => "webp".to_string(),
        "image/jpeg" => "jpg".to_string(),
        _ => std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_string(),
    }
}

/// Stills get cropped and re-encoded; animated and non-image payloads pass
/// through untouched.
fn is_croppable(mime_type: &str) -> bool {
    mime_type.starts_with("image/") && mime_type != "image/gif"
}

/// POST /posts/:id/media - Attach an uploaded file to an own post.
///
/// Image payloads are cropped to the requested aspect and re-encoded as
/// JPEG before storage; everything else is stored as received. Files land
/// under `{media_dir}/{author}/{post}/{uuid}.{ext}`.
pub async fn upload_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<PostMedia>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let post_repo = PostRepository::new(state.db.pool.clone());
    let media_repo = MediaRepository::new(state.db.pool.clone());

    let post = post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author can attach media".to_string(),
        ));
    }

    let form = read_upload_form(multipart).await?;

    if form.bytes.len() as u64 > state.media.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File exceeds the {} byte upload limit",
            state.media.max_upload_bytes
        )));
    }

    let (stored_bytes, stored_mime, ext) = if is_croppable(&form.mime_type) {
        let cropped = crop_to_aspect(&form.bytes, &form.spec)
            .map_err(|e| ApiError::BadRequest(format!("Could not process image: {}", e)))?;
        (cropped.bytes, "image/jpeg".to_string(), "jpg".to_string())
    } else {
        let ext = extension_for(&form.mime_type, &form.file_name);
        (form.bytes, form.mime_type.clone(), ext)
    };

    let media_id = Uuid::new_v4();
    let relative = format!("{}/{}/{}.{}", user_id, post_id, media_id, ext);
    let disk_path = state.media.dir.join(&relative);

    if let Some(parent) = disk_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }
    tokio::fs::write(&disk_path, &stored_bytes)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let record = PostMedia {
        id: media_id,
        post_id,
        storage_path: disk_path.to_string_lossy().into_owned(),
        url: format!(
            "{}/{}",
            state.media.public_base_url.trim_end_matches('/'),
            relative
        ),
        mime_type: stored_mime,
        size_bytes: stored_bytes.len() as i64,
        created_at: Utc::now(),
    };

    media_repo
        .create(&record)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(record))
}
