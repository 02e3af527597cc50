//! mnema: offline-first flashcard core
//!
//! The library is the data layer of a flashcard app: a durable local
//! store with an in-memory mirror, fixed-interval review scheduling,
//! streak tracking, JSON/CSV export and import, and a last-write-wins
//! sync engine speaking to an authenticated remote API (a reference
//! axum implementation of which lives in [`server`]).

pub mod config;
pub mod exchange;
pub mod notify;
pub mod review;
pub mod server;
pub mod stats;
pub mod store;
pub mod streak;
pub mod study;
pub mod sync;

pub use config::Config;
pub use store::{Card, Deck, DeckStore, Rating, StoreError, StreakData};
pub use sync::{SyncError, SyncService};
