use anyhow::Result;
use std::collections::HashMap;
use uuid::Uuid;

use sirius_types::Profile;

use crate::db::repositories::{AccountRepository, ProfileRepository};
use crate::db::DbPool;

/// Resolves batches of user ids to display profiles.
///
/// Two merged sources: the public `users` table (authoritative for
/// `full_name`/`career`) and, for ids without a public row, an elevated
/// lookup against the `accounts` table (authoritative for the email of
/// otherwise-invisible users). Resolved fallbacks are written back to the
/// public table on a best-effort basis so the next read is a plain select.
pub struct ProfileResolver {
    profiles: ProfileRepository,
    accounts: AccountRepository,
}

impl ProfileResolver {
    pub fn new(pool: DbPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            accounts: AccountRepository::new(pool),
        }
    }

    /// Resolve each id to a profile. Every requested id that corresponds to
    /// an existing account appears in the result; unknown ids are omitted.
    pub fn resolve(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Profile>> {
        let mut resolved = self.profiles.get_many(ids)?;

        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            // Elevated fallback: account email only. Per-id failures are
            // logged and skipped, never fatal to the batch.
            match self.accounts.get_by_id(id) {
                Ok(Some(account)) => {
                    let profile = Profile {
                        id: *id,
                        full_name: None,
                        career: None,
                        email: Some(account.email),
                    };
                    if let Err(e) = self.profiles.upsert(&profile) {
                        tracing::warn!("Profile write-back failed for {}: {}", id, e);
                    }
                    resolved.insert(*id, profile);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Elevated profile lookup failed for {}: {}", id, e);
                }
            }
        }

        Ok(resolved)
    }
}

/// Deterministic, never-empty display name for a possibly-absent profile.
///
/// Chain: `full_name`, then the local part of `email`, then a fixed prefix
/// plus a truncated form of the user id.
pub fn display_alias(profile: Option<&Profile>, user_id: &Uuid) -> String {
    if let Some(profile) = profile {
        if let Some(name) = profile.full_name.as_deref() {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
        if let Some(email) = profile.email.as_deref() {
            let local = email.split('@').next().unwrap_or("");
            if !local.trim().is_empty() {
                return local.trim().to_string();
            }
        }
    }
    let mut short = user_id.simple().to_string();
    short.truncate(8);
    format!("user-{short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::Utc;
    use proptest::prelude::*;
    use sirius_types::Account;

    fn setup_db() -> Database {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        db
    }

    fn insert_account(db: &Database, id: Uuid, email: &str) {
        let repo = AccountRepository::new(db.pool.clone());
        repo.create(&Account {
            id,
            email: email.to_string(),
            password_hash: "salt$hash".to_string(),
            created_at: Utc::now(),
        })
        .expect("Failed to insert account");
    }

    #[test]
    fn test_public_row_wins_over_account_fallback() {
        let db = setup_db();
        let id = Uuid::new_v4();
        insert_account(&db, id, "maria@unab.edu.co");

        let profiles = ProfileRepository::new(db.pool.clone());
        profiles
            .upsert(&Profile {
                id,
                full_name: Some("Maria Gomez".to_string()),
                career: Some("Systems Engineering".to_string()),
                email: None,
            })
            .unwrap();

        let resolver = ProfileResolver::new(db.pool.clone());
        let resolved = resolver.resolve(&[id]).expect("Failed to resolve");

        let profile = resolved.get(&id).expect("profile missing");
        assert_eq!(profile.full_name.as_deref(), Some("Maria Gomez"));
        assert_eq!(profile.career.as_deref(), Some("Systems Engineering"));
    }

    #[test]
    fn test_missing_public_row_falls_back_and_writes_back() {
        let db = setup_db();
        let id = Uuid::new_v4();
        insert_account(&db, id, "carlos@unab.edu.co");

        let resolver = ProfileResolver::new(db.pool.clone());
        let resolved = resolver.resolve(&[id]).expect("Failed to resolve");

        let profile = resolved.get(&id).expect("profile missing");
        assert_eq!(profile.email.as_deref(), Some("carlos@unab.edu.co"));
        assert!(profile.full_name.is_none());

        // Write-back: the public table now has the row
        let public = ProfileRepository::new(db.pool.clone())
            .get_by_id(&id)
            .unwrap();
        assert!(public.is_some());
        assert_eq!(public.unwrap().email.as_deref(), Some("carlos@unab.edu.co"));
    }

    #[test]
    fn test_unknown_ids_are_omitted() {
        let db = setup_db();
        let resolver = ProfileResolver::new(db.pool.clone());
        let resolved = resolver.resolve(&[Uuid::new_v4()]).expect("Failed to resolve");
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_alias_chain() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();

        let named = Profile {
            id,
            full_name: Some("Ana Diaz".to_string()),
            career: None,
            email: Some("ana@unab.edu.co".to_string()),
        };
        assert_eq!(display_alias(Some(&named), &id), "Ana Diaz");

        let email_only = Profile {
            id,
            full_name: None,
            career: None,
            email: Some("ana.diaz@unab.edu.co".to_string()),
        };
        assert_eq!(display_alias(Some(&email_only), &id), "ana.diaz");

        let empty = Profile {
            id,
            full_name: None,
            career: None,
            email: None,
        };
        assert_eq!(display_alias(Some(&empty), &id), "user-550e8400");
        assert_eq!(display_alias(None, &id), "user-550e8400");
    }

    proptest! {
        #[test]
        fn prop_alias_is_nonempty_and_deterministic(bytes: [u8; 16]) {
            let id = Uuid::from_bytes(bytes);
            let first = display_alias(None, &id);
            let second = display_alias(None, &id);
            prop_assert!(!first.is_empty());
            prop_assert_eq!(first, second);
        }
    }
}
