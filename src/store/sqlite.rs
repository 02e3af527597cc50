//! SQLite-backed persistence for the local store
//!
//! Row shapes are mapped to entities through explicit conversion
//! functions; nothing downstream touches raw rows.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::backend::StorageBackend;
use super::models::{Card, Deck, Rating, StreakData};
use super::{Result, StoreError};
use crate::review;

/// Durable local store over a single SQLite database file.
pub struct SqliteBackend {
    conn: Connection,
    #[allow(dead_code)]
    db_path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (and create if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        let mut backend = Self {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        backend.init()?;
        log::info!("local store opened at {:?}", db_path);
        Ok(backend)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut backend = Self { conn, db_path: None };
        backend.init()?;
        Ok(backend)
    }

    fn init(&mut self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS decks (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER,
                updated_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS cards (
                id TEXT PRIMARY KEY,
                deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
                word TEXT NOT NULL,
                translation TEXT NOT NULL,
                last_rating TEXT,
                next_review_date INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);
            CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards(next_review_date);

            CREATE TABLE IF NOT EXISTS study_sessions (
                date TEXT PRIMARY KEY,
                cards_studied INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS streak_data (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_streak INTEGER NOT NULL DEFAULT 0,
                best_streak INTEGER NOT NULL DEFAULT 0,
                last_study_date TEXT,
                updated_at INTEGER NOT NULL DEFAULT 0
            );

            INSERT OR IGNORE INTO streak_data (id, current_streak, best_streak)
                VALUES (1, 0, 0);
            "#,
        )?;
        Ok(())
    }

    fn load_cards(&self, deck_id: &str) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, word, translation, last_rating, next_review_date, updated_at
             FROM cards WHERE deck_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let cards = stmt
            .query_map(params![deck_id], row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    fn insert_card_tx(conn: &Connection, deck_id: &str, card: &Card) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO cards
                 (id, deck_id, word, translation, last_rating, next_review_date,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                card.id,
                deck_id,
                card.word,
                card.translation,
                card.last_rating.map(|r| r.as_str()),
                card.next_review_date,
                Utc::now().timestamp_millis(),
                card.updated_at,
            ],
        )?;
        Ok(())
    }

    fn insert_deck_tx(conn: &Connection, deck: &Deck) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO decks (id, name, is_favorite, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                deck.id,
                deck.name,
                deck.is_favorite as i64,
                deck.created_at.unwrap_or_else(|| Utc::now().timestamp_millis()),
                deck.updated_at,
            ],
        )?;
        // Cards are newest-first; insert tail-first so rowid order matches
        // on reload.
        for card in deck.cards.iter().rev() {
            Self::insert_card_tx(conn, &deck.id, card)?;
        }
        Ok(())
    }
}

fn row_to_card(row: &Row<'_>) -> rusqlite::Result<Card> {
    let rating = row
        .get::<_, Option<String>>(3)?
        .as_deref()
        .and_then(Rating::parse);
    Ok(Card {
        id: row.get(0)?,
        word: row.get(1)?,
        translation: row.get(2)?,
        last_rating: rating,
        next_review_label: rating.map(|r| review::review_label(r).to_string()),
        next_review_date: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn row_to_deck(row: &Row<'_>) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        cards: Vec::new(),
        is_favorite: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn row_to_streak(row: &Row<'_>) -> rusqlite::Result<StreakData> {
    let last = row
        .get::<_, Option<String>>(2)?
        .and_then(|s| s.parse::<NaiveDate>().ok());
    Ok(StreakData {
        current_streak: row.get::<_, i64>(0)?.max(0) as u32,
        best_streak: row.get::<_, i64>(1)?.max(0) as u32,
        last_study_date: last,
        updated_at: row.get(3)?,
    })
}

impl StorageBackend for SqliteBackend {
    fn load_decks(&self) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_favorite, created_at, updated_at
             FROM decks ORDER BY created_at DESC, rowid DESC",
        )?;
        let mut decks = stmt
            .query_map([], row_to_deck)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for deck in &mut decks {
            deck.cards = self.load_cards(&deck.id)?;
        }
        Ok(decks)
    }

    fn insert_deck(&mut self, deck: &Deck) -> Result<()> {
        Self::insert_deck_tx(&self.conn, deck)
    }

    fn update_deck(&mut self, deck: &Deck) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE decks SET name = ?2, is_favorite = ?3, updated_at = ?4 WHERE id = ?1",
            params![deck.id, deck.name, deck.is_favorite as i64, deck.updated_at],
        )?;
        Ok(changed > 0)
    }

    fn delete_deck(&mut self, deck_id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
        Ok(changed > 0)
    }

    fn insert_card(&mut self, deck_id: &str, card: &Card) -> Result<()> {
        Self::insert_card_tx(&self.conn, deck_id, card)
    }

    fn update_card(&mut self, card: &Card) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE cards SET word = ?2, translation = ?3, last_rating = ?4,
                              next_review_date = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                card.id,
                card.word,
                card.translation,
                card.last_rating.map(|r| r.as_str()),
                card.next_review_date,
                card.updated_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_card(&mut self, card_id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1", params![card_id])?;
        Ok(changed > 0)
    }

    fn replace_decks(&mut self, decks: &[Deck]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cards", [])?;
        tx.execute("DELETE FROM decks", [])?;
        for deck in decks.iter().rev() {
            Self::insert_deck_tx(&tx, deck)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn streak(&self) -> Result<StreakData> {
        self.conn
            .query_row(
                "SELECT current_streak, best_streak, last_study_date, updated_at
                 FROM streak_data WHERE id = 1",
                [],
                row_to_streak,
            )
            .map_err(StoreError::from)
    }

    fn set_streak(&mut self, streak: &StreakData) -> Result<()> {
        self.conn.execute(
            "UPDATE streak_data
             SET current_streak = ?1, best_streak = ?2, last_study_date = ?3, updated_at = ?4
             WHERE id = 1",
            params![
                streak.current_streak,
                streak.best_streak,
                streak.last_study_date.map(|d| d.to_string()),
                streak.updated_at,
            ],
        )?;
        Ok(())
    }

    fn add_session_cards(&mut self, date: NaiveDate, cards: u32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO study_sessions (date, cards_studied) VALUES (?1, ?2)
             ON CONFLICT(date) DO UPDATE SET
                 cards_studied = cards_studied + excluded.cards_studied",
            params![date.to_string(), cards],
        )?;
        Ok(())
    }

    fn session_dates(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT date FROM study_sessions WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let dates = stmt
            .query_map(params![from.to_string(), to.to_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dates
            .into_iter()
            .filter_map(|s| s.parse::<NaiveDate>().ok())
            .collect())
    }

    fn cards_studied_on(&self, date: NaiveDate) -> Result<u32> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "SELECT cards_studied FROM study_sessions WHERE date = ?1",
                params![date.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0).max(0) as u32)
    }
}
