use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use sirius_types::Account;

use crate::db::DbPool;

pub struct AccountRepository {
    pool: DbPool,
}

impl AccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new account
    pub fn create(&self, account: &Account) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO accounts (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            (
                account.id.to_string(),
                &account.email,
                &account.password_hash,
                account.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create account")?;
        Ok(())
    }

    /// Get account by ID
    pub fn get_by_id(&self, account_id: &Uuid) -> Result<Option<Account>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE id = ?",
        )?;

        let account = stmt
            .query_row([account_id.to_string()], Self::row_to_account)
            .optional()?;

        Ok(account)
    }

    /// Get account by email
    pub fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = ?",
        )?;

        let account = stmt.query_row([email], Self::row_to_account).optional()?;

        Ok(account)
    }

    /// Replace the stored password hash
    pub fn update_password_hash(&self, account_id: &Uuid, password_hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE accounts SET password_hash = ? WHERE id = ?",
            [password_hash, &account_id.to_string()],
        )
        .context("Failed to update password hash")?;
        Ok(())
    }

    fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
        Ok(Account {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            email: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
        })
    }
}
