use anyhow::Result;
use uuid::Uuid;

use sirius_types::ServiceLink;

use crate::db::DbPool;

pub struct ServiceRepository {
    pool: DbPool,
}

impl ServiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All directory entries, ordered for stable category grouping
    pub fn list_all(&self) -> Result<Vec<ServiceLink>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, name, url, description
             FROM services
             ORDER BY category, name",
        )?;

        let services = stmt
            .query_map([], |row| {
                Ok(ServiceLink {
                    id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                    category: row.get(1)?,
                    name: row.get(2)?,
                    url: row.get(3)?,
                    description: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(services)
    }
}
