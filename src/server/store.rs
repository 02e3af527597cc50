//! Per-user document store backing the remote API
//!
//! Decks and streaks are stored as JSON documents keyed by user, the
//! way the sync protocol sees them; `updated_at` is denormalized into a
//! column for ordering. Batch writes run in a single transaction so a
//! failed sync leaves the store exactly as it was.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::Result;
use crate::store::{Deck, StreakData, User};
use crate::sync::client::UserProfile;

pub struct ServerStore {
    conn: Connection,
}

impl ServerStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(db_path)?;
        let mut store = Self { conn };
        store.init()?;
        log::info!("server store opened at {:?}", db_path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT,
                image_url TEXT,
                created_at INTEGER NOT NULL,
                last_login_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS decks (
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                doc TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_decks_user_updated
                ON decks(user_id, updated_at DESC);

            CREATE TABLE IF NOT EXISTS streaks (
                user_id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    // ==================== Decks ====================

    pub fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc FROM decks WHERE user_id = ?1 ORDER BY updated_at DESC, id ASC",
        )?;
        let docs = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut decks = Vec::with_capacity(docs.len());
        for doc in docs {
            decks.push(serde_json::from_str(&doc)?);
        }
        Ok(decks)
    }

    pub fn get_deck(&self, user_id: &str, deck_id: &str) -> Result<Option<Deck>> {
        let doc: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM decks WHERE user_id = ?1 AND id = ?2",
                params![user_id, deck_id],
                |row| row.get(0),
            )
            .optional()?;
        match doc {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    pub fn put_deck(&mut self, user_id: &str, deck: &Deck) -> Result<()> {
        Self::put_deck_tx(&self.conn, user_id, deck)
    }

    fn put_deck_tx(conn: &Connection, user_id: &str, deck: &Deck) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO decks (user_id, id, doc, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                deck.id,
                serde_json::to_string(deck)?,
                deck.updated_at.unwrap_or(0),
            ],
        )?;
        Ok(())
    }

    pub fn delete_deck(&mut self, user_id: &str, deck_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM decks WHERE user_id = ?1 AND id = ?2",
            params![user_id, deck_id],
        )?;
        Ok(changed > 0)
    }

    /// Write every staged deck in one transaction: either all of them
    /// land or none do.
    pub fn apply_batch(&mut self, user_id: &str, decks: &[Deck]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for deck in decks {
            Self::put_deck_tx(&tx, user_id, deck)?;
        }
        tx.commit()?;
        Ok(())
    }

    // ==================== Streak ====================

    pub fn streak(&self, user_id: &str) -> Result<Option<StreakData>> {
        let doc: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM streaks WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        match doc {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    pub fn set_streak(&mut self, user_id: &str, streak: &StreakData) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO streaks (user_id, doc) VALUES (?1, ?2)",
            params![user_id, serde_json::to_string(streak)?],
        )?;
        Ok(())
    }

    // ==================== Users ====================

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, email, name, image_url, created_at, last_login_at
                 FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        image_url: row.get(3)?,
                        created_at: row.get(4)?,
                        last_login_at: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Create the user on first sign-in, refresh profile and login time
    /// afterwards.
    pub fn upsert_user(&mut self, user_id: &str, profile: &UserProfile) -> Result<User> {
        let now = Utc::now().timestamp_millis();
        let existing = self.get_user(user_id)?;

        match existing {
            Some(user) => {
                self.conn.execute(
                    "UPDATE users SET email = ?2, name = ?3, image_url = ?4, last_login_at = ?5
                     WHERE id = ?1",
                    params![user_id, profile.email, profile.name, profile.image_url, now],
                )?;
                Ok(User {
                    email: profile.email.clone(),
                    name: profile.name.clone(),
                    image_url: profile.image_url.clone(),
                    last_login_at: Some(now),
                    ..user
                })
            }
            None => {
                let user = User {
                    id: user_id.to_string(),
                    email: profile.email.clone(),
                    name: profile.name.clone(),
                    image_url: profile.image_url.clone(),
                    created_at: now,
                    last_login_at: Some(now),
                };
                self.conn.execute(
                    "INSERT INTO users (id, email, name, image_url, created_at, last_login_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        user.id,
                        user.email,
                        user.name,
                        user.image_url,
                        user.created_at,
                        user.last_login_at,
                    ],
                )?;
                Ok(user)
            }
        }
    }

    /// Delete the user and everything they own, atomically.
    pub fn delete_user(&mut self, user_id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM decks WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM streaks WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(id: &str, updated_at: i64) -> Deck {
        let mut deck = Deck::new(format!("Deck {id}"));
        deck.id = id.to_string();
        deck.updated_at = Some(updated_at);
        deck
    }

    fn profile(email: &str) -> UserProfile {
        UserProfile {
            email: email.to_string(),
            name: None,
            image_url: None,
        }
    }

    #[test]
    fn decks_are_scoped_per_user() {
        let mut store = ServerStore::open_in_memory().unwrap();
        store.put_deck("alice", &deck("d1", 10)).unwrap();
        store.put_deck("bob", &deck("d2", 20)).unwrap();

        assert_eq!(store.list_decks("alice").unwrap().len(), 1);
        assert_eq!(store.list_decks("bob").unwrap().len(), 1);
        assert!(store.get_deck("alice", "d2").unwrap().is_none());
    }

    #[test]
    fn listing_orders_by_updated_at_desc() {
        let mut store = ServerStore::open_in_memory().unwrap();
        store.put_deck("alice", &deck("old", 10)).unwrap();
        store.put_deck("alice", &deck("new", 30)).unwrap();
        store.put_deck("alice", &deck("mid", 20)).unwrap();

        let ids: Vec<_> = store
            .list_decks("alice")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn batch_apply_is_all_or_nothing() {
        let mut store = ServerStore::open_in_memory().unwrap();
        store
            .apply_batch("alice", &[deck("d1", 1), deck("d2", 2)])
            .unwrap();
        assert_eq!(store.list_decks("alice").unwrap().len(), 2);
    }

    #[test]
    fn user_upsert_then_cascade_delete() {
        let mut store = ServerStore::open_in_memory().unwrap();
        let created = store.upsert_user("alice", &profile("a@example.com")).unwrap();
        assert_eq!(created.email, "a@example.com");

        let updated = store.upsert_user("alice", &profile("new@example.com")).unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.email, "new@example.com");

        store.put_deck("alice", &deck("d1", 1)).unwrap();
        store
            .set_streak(
                "alice",
                &StreakData {
                    current_streak: 1,
                    best_streak: 1,
                    last_study_date: None,
                    updated_at: 0,
                },
            )
            .unwrap();

        store.delete_user("alice").unwrap();
        assert!(store.get_user("alice").unwrap().is_none());
        assert!(store.list_decks("alice").unwrap().is_empty());
        assert!(store.streak("alice").unwrap().is_none());
    }
}
