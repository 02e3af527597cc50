//! Deck and app-level statistics derived from the store

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::review;
use crate::store::{Card, Deck, DeckStore, Rating, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    pub total_cards: usize,
    pub due_cards: usize,
    /// Never rated.
    pub new_cards: usize,
    /// Rated at least once but not yet mastered.
    pub learned_cards: usize,
    /// Last rating was easy.
    pub mastered_cards: usize,
    /// Share of good/easy among rated cards, in percent.
    pub average_retention: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingDistribution {
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
    pub unrated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStats {
    pub total_decks: usize,
    pub total_cards: usize,
    pub total_due_cards: usize,
    pub cards_studied_today: u32,
    pub current_streak: u32,
}

pub fn deck_stats(deck: &Deck, now: DateTime<Utc>) -> DeckStats {
    let total_cards = deck.cards.len();
    let due_cards = deck
        .cards
        .iter()
        .filter(|c| review::is_due(c.next_review_date, now))
        .count();
    let new_cards = deck.cards.iter().filter(|c| c.last_rating.is_none()).count();
    let mastered_cards = deck
        .cards
        .iter()
        .filter(|c| c.last_rating == Some(Rating::Easy))
        .count();
    let learned_cards = total_cards - new_cards - mastered_cards;

    let rated = total_cards - new_cards;
    let positive = deck
        .cards
        .iter()
        .filter(|c| matches!(c.last_rating, Some(Rating::Good) | Some(Rating::Easy)))
        .count();
    let average_retention = if rated > 0 {
        ((positive * 100) as f64 / rated as f64).round() as u32
    } else {
        0
    };

    DeckStats {
        total_cards,
        due_cards,
        new_cards,
        learned_cards,
        mastered_cards,
        average_retention,
    }
}

pub fn rating_distribution(cards: &[Card]) -> RatingDistribution {
    let mut dist = RatingDistribution::default();
    for card in cards {
        match card.last_rating {
            Some(Rating::Again) => dist.again += 1,
            Some(Rating::Hard) => dist.hard += 1,
            Some(Rating::Good) => dist.good += 1,
            Some(Rating::Easy) => dist.easy += 1,
            None => dist.unrated += 1,
        }
    }
    dist
}

pub fn app_stats(store: &DeckStore, now: DateTime<Utc>) -> Result<AppStats> {
    let decks = store.decks();
    let total_cards = decks.iter().map(|d| d.cards.len()).sum();
    let total_due_cards = decks
        .iter()
        .flat_map(|d| d.cards.iter())
        .filter(|c| review::is_due(c.next_review_date, now))
        .count();

    Ok(AppStats {
        total_decks: decks.len(),
        total_cards,
        total_due_cards,
        cards_studied_today: store.cards_studied_today()?,
        current_streak: store.streak().current_streak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(rating: Option<Rating>, next_review: Option<i64>) -> Card {
        let mut card = Card::new("w".to_string(), "t".to_string());
        card.last_rating = rating;
        card.next_review_date = next_review;
        card
    }

    #[test]
    fn deck_stats_buckets_cards() {
        let now = Utc::now();
        let future = now.timestamp() + 1_000;
        let mut deck = Deck::new("Animals".to_string());
        deck.cards = vec![
            card(None, None),
            card(Some(Rating::Again), Some(now.timestamp() - 10)),
            card(Some(Rating::Good), Some(future)),
            card(Some(Rating::Easy), Some(future)),
        ];

        let stats = deck_stats(&deck, now);
        assert_eq!(stats.total_cards, 4);
        assert_eq!(stats.new_cards, 1);
        assert_eq!(stats.learned_cards, 2);
        assert_eq!(stats.mastered_cards, 1);
        // Unscheduled card plus the overdue one.
        assert_eq!(stats.due_cards, 2);
        // 2 positive of 3 rated.
        assert_eq!(stats.average_retention, 67);
    }

    #[test]
    fn distribution_counts_every_bucket() {
        let cards = vec![
            card(Some(Rating::Again), None),
            card(Some(Rating::Again), None),
            card(Some(Rating::Easy), None),
            card(None, None),
        ];
        let dist = rating_distribution(&cards);
        assert_eq!(dist.again, 2);
        assert_eq!(dist.easy, 1);
        assert_eq!(dist.unrated, 1);
        assert_eq!(dist.hard + dist.good, 0);
    }
}
