//! Polymorphic persistence seam for the local store
//!
//! Two implementations exist: [`SqliteBackend`](super::sqlite::SqliteBackend)
//! backed by real persistence, and [`NullBackend`] for platforms without a
//! durable store, which accepts every write and returns empty defaults on
//! read. The implementation is chosen once at startup via
//! [`Config`](crate::config::Config), not by scattered runtime checks.

use chrono::NaiveDate;

use super::models::{Card, Deck, StreakData};
use super::Result;

/// Durable-layer operations behind the in-memory mirror.
///
/// Implementations persist exactly what they are handed; validation and
/// timestamp bookkeeping happen in [`DeckStore`](super::DeckStore) before
/// the backend is reached.
pub trait StorageBackend: Send {
    /// Load every deck with its cards, newest deck and newest card first.
    fn load_decks(&self) -> Result<Vec<Deck>>;

    fn insert_deck(&mut self, deck: &Deck) -> Result<()>;

    /// Update a deck row (name, favorite flag, updated_at). Returns false
    /// when the deck does not exist.
    fn update_deck(&mut self, deck: &Deck) -> Result<bool>;

    /// Delete a deck and, by cascade, its cards. Returns false when absent.
    fn delete_deck(&mut self, deck_id: &str) -> Result<bool>;

    fn insert_card(&mut self, deck_id: &str, card: &Card) -> Result<()>;

    /// Update a card row. Returns false when the card does not exist.
    fn update_card(&mut self, card: &Card) -> Result<bool>;

    fn delete_card(&mut self, card_id: &str) -> Result<bool>;

    /// Replace the entire deck collection in one atomic write. Used by the
    /// sync engine so a failed apply leaves the previous state intact.
    fn replace_decks(&mut self, decks: &[Deck]) -> Result<()>;

    fn streak(&self) -> Result<StreakData>;

    fn set_streak(&mut self, streak: &StreakData) -> Result<()>;

    /// Accumulate a study-session row for `date`, creating it when absent.
    fn add_session_cards(&mut self, date: NaiveDate, cards: u32) -> Result<()>;

    /// Dates in `[from, to]` (inclusive) that have a study-session row.
    fn session_dates(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>>;

    /// Cards studied on `date`, 0 when no session exists.
    fn cards_studied_on(&self, date: NaiveDate) -> Result<u32>;
}

/// No-op backend for builds without a persistence layer.
///
/// Reads yield empty defaults and writes succeed without effect, so the
/// in-memory mirror keeps the app functional in a degraded, non-durable
/// mode instead of erroring.
#[derive(Debug, Default)]
pub struct NullBackend;

impl StorageBackend for NullBackend {
    fn load_decks(&self) -> Result<Vec<Deck>> {
        Ok(Vec::new())
    }

    fn insert_deck(&mut self, _deck: &Deck) -> Result<()> {
        Ok(())
    }

    fn update_deck(&mut self, _deck: &Deck) -> Result<bool> {
        Ok(true)
    }

    fn delete_deck(&mut self, _deck_id: &str) -> Result<bool> {
        Ok(false)
    }

    fn insert_card(&mut self, _deck_id: &str, _card: &Card) -> Result<()> {
        Ok(())
    }

    fn update_card(&mut self, _card: &Card) -> Result<bool> {
        Ok(true)
    }

    fn delete_card(&mut self, _card_id: &str) -> Result<bool> {
        Ok(false)
    }

    fn replace_decks(&mut self, _decks: &[Deck]) -> Result<()> {
        Ok(())
    }

    fn streak(&self) -> Result<StreakData> {
        Ok(StreakData::default())
    }

    fn set_streak(&mut self, _streak: &StreakData) -> Result<()> {
        Ok(())
    }

    fn add_session_cards(&mut self, _date: NaiveDate, _cards: u32) -> Result<()> {
        Ok(())
    }

    fn session_dates(&self, _from: NaiveDate, _to: NaiveDate) -> Result<Vec<NaiveDate>> {
        Ok(Vec::new())
    }

    fn cards_studied_on(&self, _date: NaiveDate) -> Result<u32> {
        Ok(0)
    }
}
