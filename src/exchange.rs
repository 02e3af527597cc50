//! Deck export and import (JSON and CSV)
//!
//! Exports carry a versioned envelope; imports validate every deck and
//! card against the store's rules, recording failures per row instead
//! of aborting. Ids and timestamps are never preserved across a round
//! trip; materializing an import always mints fresh ones.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::review;
use crate::store::{validation, Card, Deck, Rating};

pub const EXPORT_VERSION: &str = "1.0";

const CSV_HEADER: [&str; 4] = ["deck_name", "word", "translation", "last_rating"];

/// Versioned export envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub exported_at: String,
    pub decks: Vec<ExportedDeck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDeck {
    pub name: String,
    pub cards: Vec<ExportedCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedCard {
    pub word: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rating: Option<Rating>,
}

/// Outcome of parsing an import payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// True only when zero errors occurred.
    pub success: bool,
    pub decks_imported: usize,
    pub cards_imported: usize,
    pub errors: Vec<String>,
    /// The validated decks, ready for [`materialize`].
    #[serde(skip)]
    pub decks: Vec<ExportedDeck>,
}

impl ImportResult {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            decks_imported: 0,
            cards_imported: 0,
            errors: vec![error],
            decks: Vec::new(),
        }
    }
}

// ==================== Export ====================

fn to_exported(decks: &[Deck]) -> Vec<ExportedDeck> {
    decks
        .iter()
        .map(|deck| ExportedDeck {
            name: deck.name.clone(),
            cards: deck
                .cards
                .iter()
                .map(|card| ExportedCard {
                    word: card.word.clone(),
                    translation: card.translation.clone(),
                    last_rating: card.last_rating,
                })
                .collect(),
        })
        .collect()
}

pub fn export_to_json(decks: &[Deck]) -> String {
    let data = ExportData {
        version: EXPORT_VERSION.to_string(),
        exported_at: Utc::now().to_rfc3339(),
        decks: to_exported(decks),
    };
    // The envelope contains no non-serializable values, so this cannot
    // fail.
    serde_json::to_string_pretty(&data).unwrap_or_default()
}

/// One row per card, RFC4180 quoting for embedded commas, quotes and
/// newlines.
pub fn export_to_csv(decks: &[Deck]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // Writing to a Vec cannot fail.
    let _ = writer.write_record(CSV_HEADER);
    for deck in decks {
        for card in &deck.cards {
            let rating = card.last_rating.map(|r| r.as_str()).unwrap_or("");
            let _ = writer.write_record([
                deck.name.as_str(),
                card.word.as_str(),
                card.translation.as_str(),
                rating,
            ]);
        }
    }
    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}

// ==================== Import ====================

pub fn parse_json_import(json: &str) -> ImportResult {
    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(err) => return ImportResult::failed(format!("Failed to parse JSON: {err}")),
    };

    let Some(raw_decks) = value.get("decks").and_then(|d| d.as_array()) else {
        return ImportResult::failed("Invalid JSON structure: missing decks array".to_string());
    };

    let mut errors = Vec::new();
    let mut decks = Vec::new();
    let mut cards_imported = 0;

    for (i, raw_deck) in raw_decks.iter().enumerate() {
        let Some(raw_name) = raw_deck.get("name").and_then(|n| n.as_str()) else {
            errors.push(format!("Deck {}: missing name", i + 1));
            continue;
        };
        let name = match validation::deck_name(raw_name) {
            Ok(name) => name,
            Err(err) => {
                errors.push(format!("Deck \"{raw_name}\": {err}"));
                continue;
            }
        };
        let Some(raw_cards) = raw_deck.get("cards").and_then(|c| c.as_array()) else {
            errors.push(format!("Deck \"{name}\": missing cards array"));
            continue;
        };

        let mut cards = Vec::new();
        for (j, raw_card) in raw_cards.iter().enumerate() {
            let word = raw_card.get("word").and_then(|w| w.as_str());
            let translation = raw_card.get("translation").and_then(|t| t.as_str());
            let (Some(word), Some(translation)) = (word, translation) else {
                errors.push(format!(
                    "Deck \"{name}\", Card {}: missing word or translation",
                    j + 1
                ));
                continue;
            };
            match validation::card_fields(word, translation) {
                Ok((word, translation)) => {
                    cards.push(ExportedCard {
                        word,
                        translation,
                        last_rating: raw_card
                            .get("lastRating")
                            .and_then(|r| r.as_str())
                            .and_then(Rating::parse),
                    });
                    cards_imported += 1;
                }
                Err(err) => {
                    errors.push(format!("Deck \"{name}\", Card {}: {err}", j + 1));
                }
            }
        }

        decks.push(ExportedDeck { name, cards });
    }

    ImportResult {
        success: errors.is_empty(),
        decks_imported: decks.len(),
        cards_imported,
        errors,
        decks,
    }
}

pub fn parse_csv_import(input: &str) -> ImportResult {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut errors = Vec::new();
    // First-appearance order of deck names is preserved.
    let mut decks: Vec<ExportedDeck> = Vec::new();
    let mut cards_imported = 0;
    let mut rows = 0;

    for (i, record) in reader.records().enumerate() {
        rows += 1;
        let row = i + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                errors.push(format!("Row {row}: {err}"));
                continue;
            }
        };
        if record.len() < 3 {
            errors.push(format!("Row {row}: insufficient columns (expected at least 3)"));
            continue;
        }

        let name = match validation::deck_name(&record[0]) {
            Ok(name) => name,
            Err(err) => {
                errors.push(format!("Row {row}: {err}"));
                continue;
            }
        };
        let (word, translation) = match validation::card_fields(&record[1], &record[2]) {
            Ok(fields) => fields,
            Err(err) => {
                errors.push(format!("Row {row}: {err}"));
                continue;
            }
        };

        let card = ExportedCard {
            word,
            translation,
            last_rating: record.get(3).and_then(Rating::parse),
        };

        match decks.iter_mut().find(|d| d.name == name) {
            Some(deck) => deck.cards.push(card),
            None => decks.push(ExportedDeck {
                name,
                cards: vec![card],
            }),
        }
        cards_imported += 1;
    }

    if rows == 0 {
        return ImportResult::failed("CSV file is empty or has no data rows".to_string());
    }

    ImportResult {
        success: errors.is_empty(),
        decks_imported: decks.len(),
        cards_imported,
        errors,
        decks,
    }
}

/// Turn validated import data into store-ready decks with freshly minted
/// ids and timestamps.
pub fn materialize(decks: &[ExportedDeck]) -> Vec<Deck> {
    decks
        .iter()
        .map(|exported| {
            let mut deck = Deck::new(exported.name.clone());
            deck.cards = exported
                .cards
                .iter()
                .map(|card| {
                    let mut minted = Card::new(card.word.clone(), card.translation.clone());
                    minted.last_rating = card.last_rating;
                    minted.next_review_label = card
                        .last_rating
                        .map(|r| review::review_label(r).to_string());
                    minted
                })
                .collect();
            deck
        })
        .collect()
}
