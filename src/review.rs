//! Fixed-interval review scheduling
//!
//! Maps a rating to the next review time and a human label:
//!
//! | Rating | Interval | Label |
//! |--------|----------|-------|
//! | again  | 1 minute | "1m"  |
//! | hard   | 8 minutes| "8m"  |
//! | good   | 15 minutes | "15m" |
//! | easy   | 3 days   | "3d"  |
//!
//! Intervals are constants per rating, not adaptive; the scheduling
//! functions are pure and have no error conditions.

use chrono::{DateTime, Duration, Utc};

use crate::store::Rating;

/// Review interval in seconds for each rating.
pub fn review_interval(rating: Rating) -> Duration {
    match rating {
        Rating::Again => Duration::seconds(60),
        Rating::Hard => Duration::seconds(480),
        Rating::Good => Duration::seconds(900),
        Rating::Easy => Duration::seconds(259_200),
    }
}

/// Compute the next review time for a rating given `now`.
pub fn next_review_at(rating: Rating, now: DateTime<Utc>) -> DateTime<Utc> {
    now + review_interval(rating)
}

/// Human-readable label for the interval a rating schedules.
pub fn review_label(rating: Rating) -> &'static str {
    match rating {
        Rating::Again => "1m",
        Rating::Hard => "8m",
        Rating::Good => "15m",
        Rating::Easy => "3d",
    }
}

/// A card is due when it has never been scheduled or its review time
/// has arrived.
pub fn is_due(next_review_date: Option<i64>, now: DateTime<Utc>) -> bool {
    match next_review_date {
        None => true,
        Some(ts) => ts <= now.timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_offsets_are_exact() {
        let now = Utc::now();
        for (rating, secs) in [
            (Rating::Again, 60),
            (Rating::Hard, 480),
            (Rating::Good, 900),
            (Rating::Easy, 259_200),
        ] {
            let next = next_review_at(rating, now);
            assert_eq!((next - now).num_seconds(), secs);
        }
    }

    #[test]
    fn labels_match_intervals() {
        assert_eq!(review_label(Rating::Again), "1m");
        assert_eq!(review_label(Rating::Hard), "8m");
        assert_eq!(review_label(Rating::Good), "15m");
        assert_eq!(review_label(Rating::Easy), "3d");
    }

    #[test]
    fn unscheduled_cards_are_due() {
        let now = Utc::now();
        assert!(is_due(None, now));
        assert!(is_due(Some(now.timestamp()), now));
        assert!(is_due(Some(now.timestamp() - 1), now));
        assert!(!is_due(Some(now.timestamp() + 60), now));
    }
}
