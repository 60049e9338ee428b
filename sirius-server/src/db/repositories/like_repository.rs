use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Toggle the (post, user) like row and return the resulting liked state.
    ///
    /// Atomic per statement: a delete that removes a row means the user had a
    /// like and now does not; otherwise an `INSERT ... ON CONFLICT DO NOTHING`
    /// either creates the row or finds a concurrent insert already did, and
    /// both outcomes are "liked". The uniqueness conflict is the correctness
    /// backstop, never surfaced as an error.
    pub fn toggle(&self, post_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;

        let removed = conn
            .execute(
                "DELETE FROM post_likes WHERE post_id = ? AND user_id = ?",
                (post_id.to_string(), user_id.to_string()),
            )
            .context("Failed to remove like")?;

        if removed > 0 {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT(post_id, user_id) DO NOTHING",
            (
                post_id.to_string(),
                user_id.to_string(),
                Utc::now().to_rfc3339(),
            ),
        )
        .context("Failed to insert like")?;

        Ok(true)
    }

    /// Insert a like, treating a uniqueness conflict as already-liked.
    pub fn insert(&self, post_id: &Uuid, user_id: &Uuid) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT(post_id, user_id) DO NOTHING",
            (
                post_id.to_string(),
                user_id.to_string(),
                Utc::now().to_rfc3339(),
            ),
        )
        .context("Failed to insert like")?;
        Ok(())
    }

    /// True like count for one post, recounted from the rows
    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// True like counts for a batch of posts, grouped by post id.
    /// Posts with no likes are absent from the map.
    pub fn counts_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;

        let placeholders = vec!["?"; post_ids.len()].join(", ");
        let query = format!(
            "SELECT post_id, COUNT(*) FROM post_likes WHERE post_id IN ({placeholders}) GROUP BY post_id"
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

    /// The subset of `post_ids` the given viewer has liked
    pub fn liked_set(&self, user_id: &Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.pool.get()?;

        let placeholders = vec!["?"; post_ids.len()].join(", ");
        let query = format!(
            "SELECT post_id FROM post_likes WHERE user_id = ? AND post_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&query)?;

        let mut params: Vec<String> = vec![user_id.to_string()];
        params.extend(post_ids.iter().map(Uuid::to_string));
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                Ok(Uuid::parse_str(&row.get::<_, String>(0)?).unwrap())
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().collect())
    }
}
