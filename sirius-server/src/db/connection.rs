use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use super::schema::{SCHEMA, SERVICE_SEED};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = Self::create_connection_manager(path);
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    fn create_connection_manager<P: AsRef<Path>>(path: P) -> SqliteConnectionManager {
        let path_str = path.as_ref().to_string_lossy();
        if path_str.trim().eq_ignore_ascii_case(MEMORY_DB_PATH) {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path)
        }
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"))
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        // Pool size 1 so every test connection sees the same memory database
        let manager = Self::create_connection_manager(MEMORY_DB_PATH);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("Failed to create in-memory database pool")?;
        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the service directory with the campus catalog
    pub fn seed_services(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SERVICE_SEED)
            .context("Failed to seed service directory")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        assert!(tables.contains(&"accounts".to_string()));
        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"posts".to_string()));
        assert!(tables.contains(&"post_media".to_string()));
        assert!(tables.contains(&"post_likes".to_string()));
        assert!(tables.contains(&"post_comments".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
        assert!(tables.contains(&"services".to_string()));
    }

    #[test]
    fn test_seed_services() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_services().expect("Failed to seed services");
        // Seeding twice must not duplicate rows
        db.seed_services().expect("Failed to reseed services");

        let conn = db.connection().expect("Failed to get connection");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))
            .expect("Failed to count services");

        assert_eq!(count, 11);
    }

    #[test]
    fn test_like_uniqueness_constraint() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let conn = db.connection().expect("Failed to get connection");
        conn.execute(
            "INSERT INTO accounts (id, email, password_hash, created_at) VALUES ('u1', 'a@b.c', 'x', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO posts (id, author_id, content, created_at) VALUES ('p1', 'u1', 'hi', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES ('p1', 'u1', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES ('p1', 'u1', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(dup.is_err(), "duplicate like row must violate the primary key");
    }
}
