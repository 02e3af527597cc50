mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mnema::store::Rating;

#[derive(Parser)]
#[command(name = "mnema-cli", about = "Flashcard store, study and sync CLI", version)]
struct Cli {
    /// Use a specific config file (default: ~/.config/mnema/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List all decks
    List,

    /// Create a new deck
    Add {
        /// Deck name
        name: String,
    },

    /// Delete a deck and its cards
    Rm {
        /// Deck id
        deck: String,
    },

    /// Toggle a deck's favorite flag
    Fav {
        /// Deck id
        deck: String,
    },

    /// Card operations
    #[command(subcommand)]
    Card(CardCommand),

    /// Show cards due for review in a deck
    Due {
        /// Deck id
        deck: String,
    },

    /// Record a completed study session for today
    Record {
        /// Number of cards studied
        cards: u32,
    },

    /// Show streak counters and weekly activity
    Streak,

    /// Show statistics for a deck, or the whole app
    Stats {
        /// Deck id (omit for app-level stats)
        deck: Option<String>,
    },

    /// Export all decks to JSON or CSV
    Export {
        /// Export format
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import decks from a JSON or CSV file
    Import {
        /// Path to the file (format detected from extension)
        file: PathBuf,
    },

    /// Synchronize with the remote store
    #[command(subcommand)]
    Sync(SyncCommand),

    /// Account operations against the remote store
    #[command(subcommand)]
    Account(AccountCommand),
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a card to a deck
    Add {
        /// Deck id
        deck: String,
        word: String,
        translation: String,
    },

    /// Rate a card after review
    Rate {
        /// Card id
        card: String,
        /// again, hard, good or easy
        #[arg(value_parser = parse_rating)]
        rating: Rating,
    },

    /// Delete a card
    Rm {
        /// Card id
        card: String,
    },
}

#[derive(Subcommand)]
enum SyncCommand {
    /// Upload local state, reconcile, and apply the merged result
    Push,
    /// Download remote state, replacing local data
    Pull,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Push the signed-in profile to the remote store
    Sync {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the remote profile
    Me,
    /// Delete the account and all remote data
    Delete,
}

#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

fn parse_rating(value: &str) -> Result<Rating, String> {
    Rating::parse(value)
        .ok_or_else(|| format!("invalid rating '{value}' (expected again, hard, good or easy)"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::List => commands::list(&app, &cli.format),
        Command::Add { name } => commands::add_deck(&app, &name, &cli.format),
        Command::Rm { deck } => commands::delete_deck(&app, &deck),
        Command::Fav { deck } => commands::toggle_favorite(&app, &deck),
        Command::Card(CardCommand::Add {
            deck,
            word,
            translation,
        }) => commands::add_card(&app, &deck, &word, &translation, &cli.format),
        Command::Card(CardCommand::Rate { card, rating }) => {
            commands::rate_card(&app, &card, rating, &cli.format)
        }
        Command::Card(CardCommand::Rm { card }) => commands::delete_card(&app, &card),
        Command::Due { deck } => commands::due(&app, &deck, &cli.format),
        Command::Record { cards } => commands::record(&app, cards, &cli.format),
        Command::Streak => commands::streak(&app, &cli.format),
        Command::Stats { deck } => commands::stats(&app, deck.as_deref(), &cli.format),
        Command::Export { format, output } => {
            commands::export(&app, &format, output.as_deref())
        }
        Command::Import { file } => commands::import(&app, &file, &cli.format),
        Command::Sync(SyncCommand::Push) => commands::sync(&app, true, &cli.format),
        Command::Sync(SyncCommand::Pull) => commands::sync(&app, false, &cli.format),
        Command::Account(AccountCommand::Sync { email, name }) => {
            commands::account_sync(&app, email, name)
        }
        Command::Account(AccountCommand::Me) => commands::account_me(&app, &cli.format),
        Command::Account(AccountCommand::Delete) => commands::account_delete(&app),
    }
}
