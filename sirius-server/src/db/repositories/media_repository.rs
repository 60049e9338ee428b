use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use sirius_types::PostMedia;

use crate::db::DbPool;

pub struct MediaRepository {
    pool: DbPool,
}

impl MediaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a stored attachment
    pub fn create(&self, media: &PostMedia) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO post_media (id, post_id, storage_path, url, mime_type, size_bytes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                media.id.to_string(),
                media.post_id.to_string(),
                &media.storage_path,
                &media.url,
                &media.mime_type,
                media.size_bytes,
                media.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create media row")?;
        Ok(())
    }

    /// All attachments for one post, in insertion order
    pub fn for_post(&self, post_id: &Uuid) -> Result<Vec<PostMedia>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, post_id, storage_path, url, mime_type, size_bytes, created_at
             FROM post_media
             WHERE post_id = ?
             ORDER BY created_at ASC, id ASC",
        )?;

        let media = stmt
            .query_map([post_id.to_string()], Self::row_to_media)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(media)
    }

    /// Attachments for a batch of posts, grouped by post id in insertion order
    pub fn for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<PostMedia>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;

        let placeholders = vec!["?"; post_ids.len()].join(", ");
        let query = format!(
            "SELECT id, post_id, storage_path, url, mime_type, size_bytes, created_at
             FROM post_media
             WHERE post_id IN ({placeholders})
             ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&query)?;

        let params: Vec<String> = post_ids.iter().map(Uuid::to_string).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_media)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut grouped: HashMap<Uuid, Vec<PostMedia>> = HashMap::new();
        for media in rows {
            grouped.entry(media.post_id).or_default().push(media);
        }
        Ok(grouped)
    }

    fn row_to_media(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostMedia> {
        Ok(PostMedia {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            post_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            storage_path: row.get(2)?,
            url: row.get(3)?,
            mime_type: row.get(4)?,
            size_bytes: row.get(5)?,
            created_at: row.get::<_, String>(6)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }
}
