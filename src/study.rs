//! In-memory study session flow
//!
//! Card cycling, flip state and per-session statistics. Sessions are
//! pure in-memory state; completing one feeds
//! [`DeckStore::record_study_session`](crate::store::DeckStore::record_study_session).

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::store::{Card, Rating};

/// Per-rating counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl RatingCounts {
    fn bump(&mut self, rating: Rating) {
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.again + self.hard + self.good + self.easy
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_cards: usize,
    pub cards_reviewed: u32,
    pub ratings: RatingCounts,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// A single run through a deck's cards.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub deck_id: String,
    pub cards: Vec<Card>,
    pub current_index: usize,
    pub is_flipped: bool,
    pub completed_cards: Vec<String>,
    pub stats: SessionStats,
}

impl StudySession {
    pub fn new(deck_id: String, cards: Vec<Card>) -> Self {
        let total = cards.len();
        Self {
            deck_id,
            cards,
            current_index: 0,
            is_flipped: false,
            completed_cards: Vec::new(),
            stats: SessionStats {
                total_cards: total,
                cards_reviewed: 0,
                ratings: RatingCounts::default(),
                started_at: Utc::now(),
                ended_at: None,
            },
        }
    }

    /// Session over a shuffled copy of the cards.
    pub fn shuffled(deck_id: String, mut cards: Vec<Card>) -> Self {
        cards.shuffle(&mut rand::thread_rng());
        Self::new(deck_id, cards)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.current_index)
    }

    pub fn advance(&mut self) {
        self.current_index = (self.current_index + 1).min(self.cards.len());
        self.is_flipped = false;
    }

    pub fn back(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
        self.is_flipped = false;
    }

    pub fn flip(&mut self) {
        self.is_flipped = !self.is_flipped;
    }

    /// Record a rating for the current card. Does not move the cursor.
    pub fn record_rating(&mut self, rating: Rating) {
        let Some(card) = self.current_card() else {
            return;
        };
        self.completed_cards.push(card.id.clone());
        self.stats.cards_reviewed += 1;
        self.stats.ratings.bump(rating);
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.cards.len()
    }

    pub fn complete(&mut self) {
        self.stats.ended_at = Some(Utc::now());
    }

    pub fn progress_percent(&self) -> u8 {
        if self.cards.is_empty() {
            return 100;
        }
        ((self.current_index * 100) / self.cards.len()) as u8
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.current_index)
    }

    pub fn duration_secs(&self) -> i64 {
        let end = self.stats.ended_at.unwrap_or_else(Utc::now);
        (end - self.stats.started_at).num_seconds().max(0)
    }

    /// Share of good/easy ratings among reviewed cards, as a percentage.
    pub fn accuracy_percent(&self) -> u32 {
        let reviewed = self.stats.cards_reviewed;
        if reviewed == 0 {
            return 0;
        }
        let positive = self.stats.ratings.good + self.stats.ratings.easy;
        (positive * 100 + reviewed / 2) / reviewed
    }
}

/// "45s", "3m 20s", "1h 5m"
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    let rest = seconds % 60;
    if minutes < 60 {
        return if rest > 0 {
            format!("{minutes}m {rest}s")
        } else {
            format!("{minutes}m")
        };
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Cards worth prioritizing: never rated, or last rated again/hard.
pub fn filter_priority_cards(cards: &[Card]) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| {
            matches!(
                card.last_rating,
                None | Some(Rating::Again) | Some(Rating::Hard)
            )
        })
        .cloned()
        .collect()
}

/// New cards first, then by last rating (again before hard before good
/// before easy).
pub fn sort_by_priority(cards: &mut [Card]) {
    fn priority(card: &Card) -> i32 {
        match card.last_rating {
            None => -1,
            Some(Rating::Again) => 0,
            Some(Rating::Hard) => 1,
            Some(Rating::Good) => 2,
            Some(Rating::Easy) => 3,
        }
    }
    cards.sort_by_key(priority);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(word: &str, rating: Option<Rating>) -> Card {
        let mut card = Card::new(word.to_string(), format!("{word}-tr"));
        card.last_rating = rating;
        card
    }

    #[test]
    fn session_walks_through_cards() {
        let mut session = StudySession::new(
            "d1".to_string(),
            vec![card("a", None), card("b", None)],
        );
        assert_eq!(session.current_card().unwrap().word, "a");
        assert_eq!(session.progress_percent(), 0);

        session.flip();
        assert!(session.is_flipped);
        session.record_rating(Rating::Good);
        session.advance();
        assert!(!session.is_flipped);
        assert_eq!(session.current_card().unwrap().word, "b");

        session.record_rating(Rating::Again);
        session.advance();
        assert!(session.is_complete());
        assert!(session.current_card().is_none());
        assert_eq!(session.progress_percent(), 100);
        assert_eq!(session.stats.cards_reviewed, 2);
        assert_eq!(session.stats.ratings.good, 1);
        assert_eq!(session.stats.ratings.again, 1);
    }

    #[test]
    fn cursor_is_clamped_at_both_ends() {
        let mut session = StudySession::new("d1".to_string(), vec![card("a", None)]);
        session.back();
        assert_eq!(session.current_index, 0);
        session.advance();
        session.advance();
        assert_eq!(session.current_index, 1);
    }

    #[test]
    fn empty_session_is_complete_immediately() {
        let session = StudySession::new("d1".to_string(), Vec::new());
        assert!(session.is_complete());
        assert_eq!(session.progress_percent(), 100);
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn accuracy_counts_good_and_easy() {
        let mut session = StudySession::new(
            "d1".to_string(),
            vec![card("a", None), card("b", None), card("c", None), card("d", None)],
        );
        for rating in [Rating::Good, Rating::Easy, Rating::Again, Rating::Hard] {
            session.record_rating(rating);
            session.advance();
        }
        assert_eq!(session.accuracy_percent(), 50);
    }

    #[test]
    fn priority_filter_and_sort() {
        let mut cards = vec![
            card("easy", Some(Rating::Easy)),
            card("new", None),
            card("again", Some(Rating::Again)),
            card("good", Some(Rating::Good)),
        ];

        let due = filter_priority_cards(&cards);
        let words: Vec<_> = due.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["new", "again"]);

        sort_by_priority(&mut cards);
        let words: Vec<_> = cards.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["new", "again", "good", "easy"]);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(200), "3m 20s");
        assert_eq!(format_duration(180), "3m");
        assert_eq!(format_duration(3_900), "1h 5m");
    }
}
