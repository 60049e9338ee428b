use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use sirius_types::Comment;

use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store a comment
    pub fn create(&self, comment: &Comment) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO post_comments (id, post_id, author_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.content,
                comment.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create comment")?;
        Ok(())
    }

    /// Most recent comments for a post, newest first
    pub fn recent_for_post(&self, post_id: &Uuid, limit: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, post_id, author_id, content, created_at
             FROM post_comments
             WHERE post_id = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )?;

        let comments = stmt
            .query_map((post_id.to_string(), limit), Self::row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// True comment count for one post
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM post_comments WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// True comment counts for a batch of posts, grouped by post id
    pub fn counts_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;

        let placeholders = vec!["?"; post_ids.len()].join(", ");
        let query = format!(
            "SELECT post_id, COUNT(*) FROM post_comments WHERE post_id IN ({placeholders}) GROUP BY post_id"
        );
        let mut stmt = conn.prepare(&query)?;

        let params: Vec<String> = post_ids.iter().map(Uuid::to_string).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                Ok((
                    Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    row.get::<_, i64>(1)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().collect())
    }

    fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            author_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
            content: row.get(3)?,
            created_at: row.get::<_, String>(4)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }
}
