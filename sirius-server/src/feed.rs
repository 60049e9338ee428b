use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use sirius_types::{FeedPost, MediaItem};

use crate::db::repositories::{CommentRepository, LikeRepository, MediaRepository, PostRepository};
use crate::db::DbPool;
use crate::profile::{display_alias, ProfileResolver};

/// Relative display form of a timestamp: "now", "5m", "3h", "2d"
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    if secs < 60 {
        return "now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    format!("{}d", hours / 24)
}

/// Load the feed: newest-first posts enriched with resolved authors, media,
/// true like/comment counts and the viewer's liked-state.
///
/// The posts query is load-bearing and aborts the whole load on failure, as
/// do the count queries (a feed with fabricated zero counts would violate
/// the count invariant silently). Profile and media lookups degrade to
/// alias/empty values instead.
pub fn load_feed(pool: &DbPool, viewer: Option<Uuid>) -> Result<Vec<FeedPost>> {
    let post_repo = PostRepository::new(pool.clone());
    let media_repo = MediaRepository::new(pool.clone());
    let like_repo = LikeRepository::new(pool.clone());
    let comment_repo = CommentRepository::new(pool.clone());
    let resolver = ProfileResolver::new(pool.clone());

    let posts = post_repo.get_all()?;
    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

    let author_ids: Vec<Uuid> = {
        let distinct: HashSet<Uuid> = posts.iter().map(|p| p.author_id).collect();
        distinct.into_iter().collect()
    };

    let profiles = resolver.resolve(&author_ids).unwrap_or_else(|e| {
        tracing::warn!("Profile resolution failed, using aliases: {}", e);
        Default::default()
    });

    let media_by_post = media_repo.for_posts(&post_ids).unwrap_or_else(|e| {
        tracing::warn!("Media lookup failed, rendering posts without media: {}", e);
        Default::default()
    });

    // True counts from the child rows; the denormalized columns are ignored
    let like_counts = like_repo.counts_for_posts(&post_ids)?;
    let comment_counts = comment_repo.counts_for_posts(&post_ids)?;

    let liked = match viewer {
        Some(user_id) => like_repo.liked_set(&user_id, &post_ids)?,
        None => HashSet::new(),
    };

    let now = Utc::now();
    let feed = posts
        .into_iter()
        .map(|post| {
            let profile = profiles.get(&post.author_id);
            let media = media_by_post
                .get(&post.id)
                .map(|items| {
                    items
                        .iter()
                        .map(|m| MediaItem {
                            url: m.url.clone(),
                            mime_type: m.mime_type.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            FeedPost {
                id: post.id,
                author_id: post.author_id,
                author: display_alias(profile, &post.author_id),
                role: profile
                    .and_then(|p| p.career.clone())
                    .unwrap_or_default(),
                timestamp: format_relative(post.created_at, now),
                created_at: post.created_at,
                content: post.content,
                likes: like_counts.get(&post.id).copied().unwrap_or(0),
                comments: comment_counts.get(&post.id).copied().unwrap_or(0),
                media,
                liked_by_me: liked.contains(&post.id),
            }
        })
        .collect();

    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_relative_buckets() {
        let now = Utc::now();
        assert_eq!(format_relative(now, now), "now");
        assert_eq!(format_relative(now - Duration::seconds(59), now), "now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5m");
        assert_eq!(format_relative(now - Duration::minutes(59), now), "59m");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3h");
        assert_eq!(format_relative(now - Duration::hours(23), now), "23h");
        assert_eq!(format_relative(now - Duration::days(2), now), "2d");
    }

    #[test]
    fn test_format_relative_future_timestamp_clamps() {
        let now = Utc::now();
        // Clock skew: a slightly-future timestamp still reads "now"
        assert_eq!(format_relative(now + Duration::seconds(30), now), "now");
    }
}
