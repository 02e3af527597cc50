//! CLI command implementations

use std::path::Path;

use anyhow::{bail, Context};
use chrono::Utc;

use mnema::exchange;
use mnema::stats;
use mnema::store::Rating;
use mnema::sync::client::UserProfile;

use crate::app::App;
use crate::{ExportFormat, OutputFormat};

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn list(app: &App, format: &OutputFormat) -> anyhow::Result<()> {
    let store = app.store.lock().unwrap();
    if *format == OutputFormat::Json {
        return print_json(&store.decks());
    }
    if store.decks().is_empty() {
        println!("no decks");
        return Ok(());
    }
    for deck in store.decks() {
        let fav = if deck.is_favorite { " *" } else { "" };
        println!("{}  {} ({} cards){}", deck.id, deck.name, deck.cards.len(), fav);
    }
    Ok(())
}

pub fn add_deck(app: &App, name: &str, format: &OutputFormat) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    let deck = store.add_deck(name)?;
    if *format == OutputFormat::Json {
        return print_json(&deck);
    }
    println!("created deck {} ({})", deck.name, deck.id);
    Ok(())
}

pub fn delete_deck(app: &App, deck_id: &str) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    if store.delete_deck(deck_id)? {
        println!("deleted {deck_id}");
    } else {
        println!("no such deck: {deck_id}");
    }
    Ok(())
}

pub fn toggle_favorite(app: &App, deck_id: &str) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    let favorite = store.toggle_favorite(deck_id)?;
    println!(
        "{deck_id} is {}",
        if favorite { "a favorite" } else { "no longer a favorite" }
    );
    Ok(())
}

pub fn add_card(
    app: &App,
    deck_id: &str,
    word: &str,
    translation: &str,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    let card = store.add_card(deck_id, word, translation)?;
    if *format == OutputFormat::Json {
        return print_json(&card);
    }
    println!("added card {} ({} = {})", card.id, card.word, card.translation);
    Ok(())
}

pub fn rate_card(
    app: &App,
    card_id: &str,
    rating: Rating,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    let card = store.rate_card(card_id, rating)?;
    if *format == OutputFormat::Json {
        return print_json(&card);
    }
    println!(
        "rated {} as {}; next review in {}",
        card.word,
        rating,
        card.next_review_label.as_deref().unwrap_or("?")
    );
    Ok(())
}

pub fn delete_card(app: &App, card_id: &str) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    if store.delete_card(card_id)? {
        println!("deleted {card_id}");
    } else {
        println!("no such card: {card_id}");
    }
    Ok(())
}

pub fn due(app: &App, deck_id: &str, format: &OutputFormat) -> anyhow::Result<()> {
    let store = app.store.lock().unwrap();
    let cards = store.due_cards(deck_id, Utc::now());
    if *format == OutputFormat::Json {
        return print_json(&cards);
    }
    if cards.is_empty() {
        println!("nothing due");
        return Ok(());
    }
    for card in cards {
        println!("{}  {} = {}", card.id, card.word, card.translation);
    }
    Ok(())
}

pub fn record(app: &App, cards: u32, format: &OutputFormat) -> anyhow::Result<()> {
    let mut store = app.store.lock().unwrap();
    let streak = store.record_study_session(cards)?;
    if *format == OutputFormat::Json {
        return print_json(&streak);
    }
    println!(
        "recorded {cards} cards; current streak {} (best {})",
        streak.current_streak, streak.best_streak
    );
    Ok(())
}

pub fn streak(app: &App, format: &OutputFormat) -> anyhow::Result<()> {
    let store = app.store.lock().unwrap();
    let streak = store.streak();
    if *format == OutputFormat::Json {
        return print_json(streak);
    }
    println!(
        "current streak: {} days (best {})",
        streak.current_streak, streak.best_streak
    );
    let activity = store.weekly_activity(Utc::now().date_naive())?;
    let bars: String = activity.iter().map(|&d| if d { '#' } else { '.' }).collect();
    println!("last 7 days:    {bars}");
    Ok(())
}

pub fn stats(app: &App, deck_id: Option<&str>, format: &OutputFormat) -> anyhow::Result<()> {
    let store = app.store.lock().unwrap();
    let now = Utc::now();

    match deck_id {
        Some(deck_id) => {
            let deck = store
                .deck(deck_id)
                .with_context(|| format!("no such deck: {deck_id}"))?;
            let stats = stats::deck_stats(deck, now);
            if *format == OutputFormat::Json {
                return print_json(&stats);
            }
            println!(
                "{}: {} cards ({} due, {} new, {} learned, {} mastered), retention {}%",
                deck.name,
                stats.total_cards,
                stats.due_cards,
                stats.new_cards,
                stats.learned_cards,
                stats.mastered_cards,
                stats.average_retention
            );
        }
        None => {
            let stats = stats::app_stats(&store, now)?;
            if *format == OutputFormat::Json {
                return print_json(&stats);
            }
            println!(
                "{} decks, {} cards ({} due); {} studied today; streak {}",
                stats.total_decks,
                stats.total_cards,
                stats.total_due_cards,
                stats.cards_studied_today,
                stats.current_streak
            );
        }
    }
    Ok(())
}

pub fn export(
    app: &App,
    format: &ExportFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let store = app.store.lock().unwrap();
    let payload = match format {
        ExportFormat::Json => exchange::export_to_json(store.decks()),
        ExportFormat::Csv => exchange::export_to_csv(store.decks()),
    };
    match output {
        Some(path) => {
            std::fs::write(path, payload)
                .with_context(|| format!("failed to write {path:?}"))?;
            println!("exported {} decks to {path:?}", store.decks().len());
        }
        None => print!("{payload}"),
    }
    Ok(())
}

pub fn import(app: &App, file: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

    let result = match file.extension().and_then(|e| e.to_str()) {
        Some("json") => exchange::parse_json_import(&raw),
        Some("csv") => exchange::parse_csv_import(&raw),
        other => bail!("unsupported import format: {other:?} (expected .json or .csv)"),
    };

    let imported = exchange::materialize(&result.decks);
    if !imported.is_empty() {
        let mut store = app.store.lock().unwrap();
        let mut decks = imported;
        decks.extend_from_slice(store.decks());
        store.replace_all(decks)?;
    }

    if *format == OutputFormat::Json {
        return print_json(&result);
    }
    println!(
        "imported {} decks, {} cards",
        result.decks_imported, result.cards_imported
    );
    for error in &result.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

pub fn sync(app: &App, push: bool, format: &OutputFormat) -> anyhow::Result<()> {
    let service = app.sync_service()?;
    let report = if push { service.push()? } else { service.pull()? };
    if *format == OutputFormat::Json {
        return print_json(&report);
    }
    println!(
        "{} {} decks in {}ms; streak {} (best {})",
        if push { "pushed" } else { "pulled" },
        report.decks_synced,
        report.duration_ms,
        report.streak.current_streak,
        report.streak.best_streak
    );
    Ok(())
}

pub fn account_sync(app: &App, email: String, name: Option<String>) -> anyhow::Result<()> {
    let client = app.api_client()?;
    let user = client.sync_user(&UserProfile {
        email,
        name,
        image_url: None,
    })?;
    println!("synced profile for {}", user.email);
    Ok(())
}

pub fn account_me(app: &App, format: &OutputFormat) -> anyhow::Result<()> {
    let client = app.api_client()?;
    let user = client.me()?;
    if *format == OutputFormat::Json {
        return print_json(&user);
    }
    println!("{} ({})", user.email, user.id);
    Ok(())
}

pub fn account_delete(app: &App) -> anyhow::Result<()> {
    let client = app.api_client()?;
    client.delete_account()?;
    println!("account deleted");
    Ok(())
}
