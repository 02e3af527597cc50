//! Merge/sync engine: reconcile local state with the remote store
//!
//! The merge algorithm lives in [`merge`] and is shared with the server
//! implementation; [`client`] talks to the remote API; [`service`]
//! orchestrates a device's sync lifecycle (single sync in flight,
//! observable state, atomic local apply).

pub mod client;
pub mod merge;
mod service;

use thiserror::Error;

use crate::store::StoreError;

pub use client::ApiClient;
pub use merge::{merge_decks, merge_streaks, DeckMerge};
pub use service::{SyncReport, SyncService, SyncState};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync already in progress")]
    InProgress,

    #[error("Not signed in")]
    Unauthorized,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether retrying the whole sync can succeed. Merge is idempotent,
    /// so every failure short of a rejected identity is retriable.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, SyncError::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
