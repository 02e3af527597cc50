//! Streak transitions over daily study sessions
//!
//! A streak counts consecutive calendar days with at least one completed
//! study session. The transition is evaluated at most once in effect per
//! day; repeated sessions on the same date only accumulate the day's
//! card count.

use chrono::{Days, NaiveDate};

use crate::store::StreakData;

/// Apply one study-session transition for `today`.
///
/// Same-day sessions leave the counters untouched; a session the day
/// after `last_study_date` extends the streak; anything else (first
/// session ever, or a gap) resets the current streak to 1. `best_streak`
/// never decreases.
pub fn advance(streak: &StreakData, today: NaiveDate, now_ms: i64) -> StreakData {
    let current = match streak.last_study_date {
        Some(last) if last == today => streak.current_streak,
        Some(last) if Some(last) == today.checked_sub_days(Days::new(1)) => {
            streak.current_streak + 1
        }
        _ => 1,
    };

    StreakData {
        current_streak: current,
        best_streak: streak.best_streak.max(current),
        last_study_date: Some(today),
        updated_at: now_ms,
    }
}
