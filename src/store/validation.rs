//! Input validation shared by the store and the import codec

use super::{Result, StoreError};

pub const MAX_DECK_NAME_LEN: usize = 100;
pub const MAX_CARD_FIELD_LEN: usize = 500;

/// Validate and normalize a deck name: non-empty after trimming, at most
/// 100 characters.
pub fn deck_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(
            "Deck name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DECK_NAME_LEN {
        return Err(StoreError::Validation(
            "Deck name must be 100 characters or less".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate and normalize a card's word: non-empty after trimming, at
/// most 500 characters.
pub fn card_word(word: &str) -> Result<String> {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("Word cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_CARD_FIELD_LEN {
        return Err(StoreError::Validation(
            "Word must be 500 characters or less".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate and normalize a card's translation.
pub fn card_translation(translation: &str) -> Result<String> {
    let trimmed = translation.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(
            "Translation cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_CARD_FIELD_LEN {
        return Err(StoreError::Validation(
            "Translation must be 500 characters or less".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate word and translation together.
pub fn card_fields(word: &str, translation: &str) -> Result<(String, String)> {
    Ok((card_word(word)?, card_translation(translation)?))
}
