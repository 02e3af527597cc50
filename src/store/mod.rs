//! Local store: durable per-device state with an in-memory mirror
//!
//! This module provides:
//! - Typed deck/card/streak models
//! - A polymorphic persistence backend (SQLite or a no-op stub)
//! - [`DeckStore`], the observable state container the rest of the
//!   system reads and mutates

pub mod backend;
mod models;
mod sqlite;
pub mod validation;

use chrono::{DateTime, Days, NaiveDate, Utc};
use thiserror::Error;

pub use backend::{NullBackend, StorageBackend};
pub use models::{Card, Deck, Rating, StreakData, StudySessionRecord, User};
pub use sqlite::SqliteBackend;

use crate::review;
use crate::streak;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

type Listener = Box<dyn Fn() + Send + Sync>;

/// Handle for removing a change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

/// Observable deck/streak state mirrored from the durable backend.
///
/// All mutating operations persist first and only then update the
/// in-memory mirror, so readers never observe a state the durable layer
/// does not hold. Mutations are expected to run sequentially (callers
/// share the store behind a mutex); listeners run synchronously after a
/// committed mutation and must not call back into the store.
pub struct DeckStore {
    backend: Box<dyn StorageBackend>,
    decks: Vec<Deck>,
    streak: StreakData,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
}

impl DeckStore {
    /// Load the mirror from the backend chosen at startup.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self> {
        let decks = backend.load_decks()?;
        let streak = backend.streak()?;
        log::info!("loaded {} decks from local store", decks.len());
        Ok(Self {
            backend,
            decks,
            streak,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    // ==================== Observation ====================

    pub fn subscribe(&mut self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener();
        }
    }

    // ==================== Deck operations ====================

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn deck(&self, deck_id: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == deck_id)
    }

    /// Create a deck and insert it at the head of the collection.
    pub fn add_deck(&mut self, name: &str) -> Result<Deck> {
        let name = validation::deck_name(name)?;
        let deck = Deck::new(name);
        self.backend.insert_deck(&deck)?;
        self.decks.insert(0, deck.clone());
        self.notify();
        Ok(deck)
    }

    /// Rename a deck.
    pub fn update_deck(&mut self, deck_id: &str, name: &str) -> Result<Deck> {
        let name = validation::deck_name(name)?;
        let index = self.deck_index(deck_id)?;

        let mut deck = self.decks[index].clone();
        deck.name = name;
        deck.updated_at = Some(Utc::now().timestamp_millis());
        self.backend.update_deck(&deck)?;

        self.decks[index] = deck.clone();
        self.notify();
        Ok(deck)
    }

    /// Flip the favorite flag, returning the new value.
    pub fn toggle_favorite(&mut self, deck_id: &str) -> Result<bool> {
        let index = self.deck_index(deck_id)?;

        let mut deck = self.decks[index].clone();
        deck.is_favorite = !deck.is_favorite;
        deck.updated_at = Some(Utc::now().timestamp_millis());
        self.backend.update_deck(&deck)?;

        let value = deck.is_favorite;
        self.decks[index] = deck;
        self.notify();
        Ok(value)
    }

    /// Delete a deck and its cards. Deleting an unknown id is a no-op
    /// returning false.
    pub fn delete_deck(&mut self, deck_id: &str) -> Result<bool> {
        let existed = self.backend.delete_deck(deck_id)?;
        let had_mirror = self.decks.iter().any(|d| d.id == deck_id);
        if had_mirror {
            self.decks.retain(|d| d.id != deck_id);
            self.notify();
        }
        Ok(existed || had_mirror)
    }

    // ==================== Card operations ====================

    /// Add a card at the head of a deck's card order.
    pub fn add_card(&mut self, deck_id: &str, word: &str, translation: &str) -> Result<Card> {
        let (word, translation) = validation::card_fields(word, translation)?;
        let index = self.deck_index(deck_id)?;

        let card = Card::new(word, translation);
        self.backend.insert_card(deck_id, &card)?;

        let mut deck = self.decks[index].clone();
        deck.cards.insert(0, card.clone());
        deck.updated_at = Some(Utc::now().timestamp_millis());
        self.backend.update_deck(&deck)?;

        self.decks[index] = deck;
        self.notify();
        Ok(card)
    }

    /// Edit a card's word and translation.
    pub fn update_card(&mut self, card_id: &str, word: &str, translation: &str) -> Result<Card> {
        let (word, translation) = validation::card_fields(word, translation)?;
        let (deck_index, card_index) = self.card_index(card_id)?;

        let mut card = self.decks[deck_index].cards[card_index].clone();
        card.word = word;
        card.translation = translation;
        card.updated_at = Some(Utc::now().timestamp_millis());
        self.commit_card(deck_index, card_index, card)
    }

    /// Rate a card, scheduling its next review.
    pub fn rate_card(&mut self, card_id: &str, rating: Rating) -> Result<Card> {
        let (deck_index, card_index) = self.card_index(card_id)?;
        let now = Utc::now();

        let mut card = self.decks[deck_index].cards[card_index].clone();
        card.last_rating = Some(rating);
        card.next_review_label = Some(review::review_label(rating).to_string());
        card.next_review_date = Some(review::next_review_at(rating, now).timestamp());
        card.updated_at = Some(now.timestamp_millis());
        self.commit_card(deck_index, card_index, card)
    }

    /// Delete a card. Deleting an unknown id is a no-op returning false.
    pub fn delete_card(&mut self, card_id: &str) -> Result<bool> {
        let existed = self.backend.delete_card(card_id)?;

        let position = self.card_index(card_id).ok();
        if let Some((deck_index, card_index)) = position {
            let mut deck = self.decks[deck_index].clone();
            deck.cards.remove(card_index);
            deck.updated_at = Some(Utc::now().timestamp_millis());
            self.backend.update_deck(&deck)?;
            self.decks[deck_index] = deck;
            self.notify();
        }
        Ok(existed || position.is_some())
    }

    /// Cards in a deck that are due: never scheduled, or scheduled at or
    /// before `now`. An unknown deck yields an empty list.
    pub fn due_cards(&self, deck_id: &str, now: DateTime<Utc>) -> Vec<Card> {
        self.deck(deck_id)
            .map(|deck| {
                deck.cards
                    .iter()
                    .filter(|c| review::is_due(c.next_review_date, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // ==================== Study tracking ====================

    pub fn streak(&self) -> &StreakData {
        &self.streak
    }

    /// Record a completed study session for today.
    pub fn record_study_session(&mut self, cards_studied: u32) -> Result<StreakData> {
        self.record_study_session_on(Utc::now().date_naive(), cards_studied)
    }

    /// Record a session for an explicit date. The streak transition takes
    /// effect at most once per calendar day; further sessions on the same
    /// date only accumulate the day's card count.
    pub fn record_study_session_on(
        &mut self,
        today: NaiveDate,
        cards_studied: u32,
    ) -> Result<StreakData> {
        self.backend.add_session_cards(today, cards_studied)?;

        let next = streak::advance(&self.streak, today, Utc::now().timestamp_millis());
        self.backend.set_streak(&next)?;
        self.streak = next.clone();
        self.notify();
        Ok(next)
    }

    /// Overwrite the streak singleton (used when applying a sync merge).
    pub fn set_streak(&mut self, streak: StreakData) -> Result<()> {
        self.backend.set_streak(&streak)?;
        self.streak = streak;
        self.notify();
        Ok(())
    }

    pub fn cards_studied_today(&self) -> Result<u32> {
        self.backend.cards_studied_on(Utc::now().date_naive())
    }

    /// Activity flags for the trailing 7 calendar days ending at `today`,
    /// oldest first.
    pub fn weekly_activity(&self, today: NaiveDate) -> Result<Vec<bool>> {
        let from = today - Days::new(6);
        let studied = self.backend.session_dates(from, today)?;
        Ok((0..7u64)
            .map(|i| studied.contains(&(from + Days::new(i))))
            .collect())
    }

    // ==================== Sync support ====================

    /// Replace the whole deck collection atomically (sync apply).
    pub fn replace_all(&mut self, decks: Vec<Deck>) -> Result<()> {
        self.backend.replace_decks(&decks)?;
        self.decks = decks;
        self.notify();
        Ok(())
    }

    // ==================== Internals ====================

    fn deck_index(&self, deck_id: &str) -> Result<usize> {
        self.decks
            .iter()
            .position(|d| d.id == deck_id)
            .ok_or_else(|| StoreError::DeckNotFound(deck_id.to_string()))
    }

    fn card_index(&self, card_id: &str) -> Result<(usize, usize)> {
        for (di, deck) in self.decks.iter().enumerate() {
            if let Some(ci) = deck.cards.iter().position(|c| c.id == card_id) {
                return Ok((di, ci));
            }
        }
        Err(StoreError::CardNotFound(card_id.to_string()))
    }

    /// Persist a mutated card plus the owning deck's bumped timestamp,
    /// then fold both into the mirror.
    fn commit_card(&mut self, deck_index: usize, card_index: usize, card: Card) -> Result<Card> {
        self.backend.update_card(&card)?;

        let mut deck = self.decks[deck_index].clone();
        deck.cards[card_index] = card.clone();
        deck.updated_at = card.updated_at.or(deck.updated_at);
        self.backend.update_deck(&deck)?;

        self.decks[deck_index] = deck;
        self.notify();
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sqlite_store() -> DeckStore {
        DeckStore::open(Box::new(SqliteBackend::open_in_memory().unwrap())).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn add_deck_validates_name() {
        let mut store = sqlite_store();
        assert!(matches!(
            store.add_deck("   "),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.add_deck(&"x".repeat(101)),
            Err(StoreError::Validation(_))
        ));

        let deck = store.add_deck("  Animals  ").unwrap();
        assert_eq!(deck.name, "Animals");
        assert!(deck.updated_at.is_some());
    }

    #[test]
    fn new_decks_go_to_the_head() {
        let mut store = sqlite_store();
        store.add_deck("First").unwrap();
        store.add_deck("Second").unwrap();
        let names: Vec<_> = store.decks().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn add_card_to_missing_deck_leaves_state_unchanged() {
        let mut store = sqlite_store();
        store.add_deck("Animals").unwrap();
        let err = store.add_card("missing", "cat", "муур").unwrap_err();
        assert!(matches!(err, StoreError::DeckNotFound(_)));
        assert!(store.decks()[0].cards.is_empty());
    }

    #[test]
    fn mutations_bump_deck_updated_at() {
        let mut store = sqlite_store();
        let deck = store.add_deck("Animals").unwrap();
        let initial = deck.updated_at.unwrap();

        let card = store.add_card(&deck.id, "cat", "муур").unwrap();
        let after_add = store.deck(&deck.id).unwrap().updated_at.unwrap();
        assert!(after_add >= initial);

        let rated = store.rate_card(&card.id, Rating::Good).unwrap();
        assert_eq!(rated.last_rating, Some(Rating::Good));
        assert_eq!(rated.next_review_label.as_deref(), Some("15m"));
        let after_rate = store.deck(&deck.id).unwrap().updated_at.unwrap();
        assert!(after_rate >= after_add);
    }

    #[test]
    fn rated_card_is_no_longer_due_until_interval_elapses() {
        let mut store = sqlite_store();
        let deck = store.add_deck("Animals").unwrap();
        let card = store.add_card(&deck.id, "cat", "муур").unwrap();

        let now = Utc::now();
        assert_eq!(store.due_cards(&deck.id, now).len(), 1);

        store.rate_card(&card.id, Rating::Easy).unwrap();
        assert!(store.due_cards(&deck.id, now).is_empty());
        let later = now + chrono::Duration::seconds(259_201);
        assert_eq!(store.due_cards(&deck.id, later).len(), 1);
    }

    #[test]
    fn deletes_are_idempotent() {
        let mut store = sqlite_store();
        let deck = store.add_deck("Animals").unwrap();
        let card = store.add_card(&deck.id, "cat", "муур").unwrap();

        assert!(store.delete_card(&card.id).unwrap());
        assert!(!store.delete_card(&card.id).unwrap());
        assert!(store.delete_deck(&deck.id).unwrap());
        assert!(!store.delete_deck(&deck.id).unwrap());
    }

    #[test]
    fn deleting_deck_cascades_in_mirror_and_backend() {
        let mut store = sqlite_store();
        let deck = store.add_deck("Animals").unwrap();
        let card = store.add_card(&deck.id, "cat", "муур").unwrap();

        assert!(store.delete_deck(&deck.id).unwrap());
        assert!(store.deck(&deck.id).is_none());
        assert!(matches!(
            store.rate_card(&card.id, Rating::Good),
            Err(StoreError::CardNotFound(_))
        ));
    }

    #[test]
    fn listeners_fire_after_committed_mutations() {
        let mut store = sqlite_store();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.add_deck("Animals").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Failed validation commits nothing and notifies nobody.
        let _ = store.add_deck("");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        store.unsubscribe(id);
        store.add_deck("More").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn study_sessions_drive_the_streak_once_per_day() {
        let mut store = sqlite_store();
        store
            .set_streak(StreakData {
                current_streak: 3,
                best_streak: 3,
                last_study_date: Some(date("2024-01-09")),
                updated_at: 0,
            })
            .unwrap();

        let after = store.record_study_session_on(date("2024-01-10"), 5).unwrap();
        assert_eq!(after.current_streak, 4);

        let again = store.record_study_session_on(date("2024-01-10"), 2).unwrap();
        assert_eq!(again.current_streak, 4);
        assert_eq!(again.best_streak, 4);
    }

    #[test]
    fn weekly_activity_is_oldest_first() {
        let mut store = sqlite_store();
        let today = date("2024-01-10");
        store.record_study_session_on(date("2024-01-10"), 1).unwrap();
        store.record_study_session_on(date("2024-01-08"), 1).unwrap();
        // Outside the window.
        store.record_study_session_on(date("2024-01-01"), 1).unwrap();

        let activity = store.weekly_activity(today).unwrap();
        assert_eq!(
            activity,
            vec![false, false, false, false, true, false, true]
        );
    }

    #[test]
    fn null_backend_degrades_to_in_memory_defaults() {
        let mut store = DeckStore::open(Box::new(NullBackend)).unwrap();
        assert!(store.decks().is_empty());
        assert_eq!(store.streak().current_streak, 0);
        assert_eq!(store.weekly_activity(date("2024-01-10")).unwrap(), vec![false; 7]);

        // Mutations still work against the mirror.
        let deck = store.add_deck("Animals").unwrap();
        store.add_card(&deck.id, "cat", "муур").unwrap();
        assert_eq!(store.decks()[0].cards.len(), 1);
    }

    #[test]
    fn replace_all_swaps_the_collection() {
        let mut store = sqlite_store();
        store.add_deck("Old").unwrap();

        let incoming = vec![Deck::new("Remote".to_string())];
        store.replace_all(incoming).unwrap();
        assert_eq!(store.decks().len(), 1);
        assert_eq!(store.decks()[0].name, "Remote");
    }
}
