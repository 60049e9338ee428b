use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use sirius_types::Post;

use crate::db::DbPool;

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, author_id, content, created_at, likes_count, comments_count)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.author_id.to_string(),
                &post.content,
                post.created_at.to_rfc3339(),
                post.likes_count,
                post.comments_count,
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get all posts, newest first
    pub fn get_all(&self) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, author_id, content, created_at, likes_count, comments_count
             FROM posts
             ORDER BY created_at DESC",
        )?;

        let posts = stmt
            .query_map([], Self::row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, author_id, content, created_at, likes_count, comments_count
             FROM posts
             WHERE id = ?",
        )?;

        let post = stmt
            .query_row([post_id.to_string()], Self::row_to_post)
            .optional()?;

        Ok(post)
    }

    /// Delete a post; like, comment and media rows go with it via cascade.
    /// Media files on disk are the caller's cleanup.
    pub fn delete(&self, post_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(())
    }

    /// Refresh the denormalized counters from the child rows.
    /// Reads never trust these; they exist to tolerate external consumers.
    pub fn refresh_counters(&self, post_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts
             SET likes_count = (SELECT COUNT(*) FROM post_likes WHERE post_id = ?1),
                 comments_count = (SELECT COUNT(*) FROM post_comments WHERE post_id = ?1)
             WHERE id = ?1",
            [post_id.to_string()],
        )
        .context("Failed to refresh post counters")?;
        Ok(())
    }

    fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            author_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            content: row.get(2)?,
            created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
            likes_count: row.get(4)?,
            comments_count: row.get(5)?,
        })
    }
}
