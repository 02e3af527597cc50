//! Data models for decks, cards and study tracking

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review rating given after flipping a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// Parse a rating from its lowercase wire/database form.
    pub fn parse(value: &str) -> Option<Rating> {
        match value.to_ascii_lowercase().as_str() {
            "again" => Some(Rating::Again),
            "hard" => Some(Rating::Hard),
            "good" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single word/translation pair with review metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub word: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_label: Option<String>,
    /// Next scheduled review as unix seconds. Unset cards are always due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<i64>,
    /// Last mutation time in unix milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Card {
    pub fn new(word: String, translation: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            word,
            translation,
            last_rating: None,
            next_review_label: None,
            next_review_date: None,
            updated_at: Some(Utc::now().timestamp_millis()),
        }
    }
}

/// A named collection of flashcards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    /// Insertion order, newest first.
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Sole authority for merge ordering. Every mutation to the deck or
    /// its cards bumps this to the mutation time (unix milliseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Deck {
    pub fn new(name: String) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            cards: Vec::new(),
            is_favorite: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }
}

/// Per-device/per-user streak counters (singleton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    pub updated_at: i64,
}

impl Default for StreakData {
    fn default() -> Self {
        Self {
            current_streak: 0,
            best_streak: 0,
            last_study_date: None,
            updated_at: Utc::now().timestamp_millis(),
        }
    }
}

/// One row per calendar day with at least one completed study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionRecord {
    pub date: NaiveDate,
    pub cards_studied: u32,
}

/// Server-side user profile, created/updated on sign-in sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_round_trips_through_wire_form() {
        for rating in Rating::ALL {
            assert_eq!(Rating::parse(rating.as_str()), Some(rating));
        }
        assert_eq!(Rating::parse("perfect"), None);
    }

    #[test]
    fn deck_serializes_camel_case() {
        let mut deck = Deck::new("Animals".to_string());
        deck.is_favorite = true;
        let json = serde_json::to_string(&deck).unwrap();
        assert!(json.contains("\"isFavorite\":true"));
        assert!(json.contains("\"updatedAt\""));
        assert!(!json.contains("\"is_favorite\""));
    }

    #[test]
    fn card_omits_unset_review_fields() {
        let card = Card::new("cat".to_string(), "муур".to_string());
        let json = serde_json::to_string(&card).unwrap();
        assert!(!json.contains("lastRating"));
        assert!(!json.contains("nextReviewDate"));
    }
}
