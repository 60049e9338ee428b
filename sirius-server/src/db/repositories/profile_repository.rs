use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use std::collections::HashMap;
use uuid::Uuid;

use sirius_types::Profile;

use crate::db::DbPool;

pub struct ProfileRepository {
    pool: DbPool,
}

impl ProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a public profile row
    pub fn upsert(&self, profile: &Profile) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, full_name, career, email) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 full_name = excluded.full_name,
                 career = excluded.career,
                 email = excluded.email",
            (
                profile.id.to_string(),
                &profile.full_name,
                &profile.career,
                &profile.email,
            ),
        )
        .context("Failed to upsert profile")?;
        Ok(())
    }

    /// Update display fields for an existing row, keeping the stored email
    pub fn update_display(
        &self,
        user_id: &Uuid,
        full_name: Option<&str>,
        career: Option<&str>,
    ) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET
                 full_name = COALESCE(?, full_name),
                 career = COALESCE(?, career)
             WHERE id = ?",
            (full_name, career, user_id.to_string()),
        )
        .context("Failed to update profile display fields")?;
        Ok(())
    }

    /// Get a single public profile row
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, full_name, career, email FROM users WHERE id = ?")?;

        let profile = stmt
            .query_row([user_id.to_string()], Self::row_to_profile)
            .optional()?;

        Ok(profile)
    }

    /// Fetch public rows for a batch of ids, keyed by id.
    /// Ids with no public row are simply absent from the map.
    pub fn get_many(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Profile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "SELECT id, full_name, career, email FROM users WHERE id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&query)?;

        let params: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let profiles = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_profile)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }

    fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            full_name: row.get(1)?,
            career: row.get(2)?,
            email: row.get(3)?,
        })
    }
}
