use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// An identity-provider account: credentials live here, display data lives
/// in the public profile row (which may be missing for a valid account).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Public profile projection of a user, as stored in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub career: Option<String>,
    pub email: Option<String>,
}

/// A post as stored; counters are denormalized and may lag the child rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// A media attachment belonging to exactly one post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMedia {
    pub id: Uuid,
    pub post_id: Uuid,
    pub storage_path: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Media entry as rendered in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    pub mime_type: String,
}

/// A fully enriched feed entry: resolved author, true counts, viewer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author: String,
    pub role: String,
    /// Relative display form ("now", "5m", "3h", "2d")
    pub timestamp: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub likes: i64,
    pub comments: i64,
    pub media: Vec<MediaItem>,
    pub liked_by_me: bool,
}

/// A comment as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// A comment with its author resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: String,
    pub timestamp: String,
    pub content: String,
}

/// One vehicle record from the campus telematics feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusPosition {
    pub lat: f64,
    pub lng: f64,
    pub plate: String,
    pub vehicle_type: String,
    pub event: String,
    pub event_time: String,
}

/// A campus service directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLink {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub url: String,
    pub description: String,
}

// Request/Response types for API

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub career: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub account: Account,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub career: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCreatedResponse {
    pub comment: CommentView,
    /// True comment count for the post after the insert.
    pub comments: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeToggleResponse {
    pub post_id: Uuid,
    pub liked: bool,
    /// True like count recounted from the like rows.
    pub likes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveProfilesRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveProfilesResponse {
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
