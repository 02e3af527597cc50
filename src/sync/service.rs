//! Per-device sync orchestration
//!
//! Only one sync may be in flight at a time; a second request is
//! rejected immediately with [`SyncError::InProgress`] rather than
//! queued. A sync either fully applies (remote batch committed, merged
//! result written into the local store atomically) or reports an error
//! and leaves local state untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use super::client::ApiClient;
use super::{Result, SyncError};
use crate::store::{DeckStore, StreakData};

/// Observable sync status, mirrored to listeners on every change.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub is_syncing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a completed sync.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub decks_synced: usize,
    pub streak: StreakData,
    pub duration_ms: u64,
}

type StateListener = Box<dyn Fn(&SyncState) + Send + Sync>;

/// Drives manual synchronization between a [`DeckStore`] and the remote
/// API.
pub struct SyncService {
    store: Arc<Mutex<DeckStore>>,
    client: ApiClient,
    in_flight: AtomicBool,
    state: Mutex<SyncState>,
    listeners: Mutex<Vec<StateListener>>,
}

/// Clears the in-flight flag when a sync attempt ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncService {
    pub fn new(store: Arc<Mutex<DeckStore>>, client: ApiClient) -> Self {
        Self {
            store,
            client,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SyncState::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state.lock().unwrap().clone()
    }

    pub fn subscribe(&self, listener: impl Fn(&SyncState) + Send + Sync + 'static) {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    fn set_state(&self, update: impl FnOnce(&mut SyncState)) {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            update(&mut state);
            state.clone()
        };
        for listener in self.listeners.lock().unwrap().iter() {
            listener(&snapshot);
        }
    }

    fn begin(&self) -> Result<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SyncError::InProgress)?;
        self.set_state(|s| {
            s.is_syncing = true;
            s.error = None;
        });
        Ok(InFlightGuard(&self.in_flight))
    }

    fn finish(&self, outcome: &Result<SyncReport>) {
        match outcome {
            Ok(report) => {
                log::info!(
                    "sync finished: {} decks in {}ms",
                    report.decks_synced,
                    report.duration_ms
                );
                self.set_state(|s| {
                    s.is_syncing = false;
                    s.last_sync_at = Some(Utc::now().timestamp_millis());
                    s.error = None;
                });
            }
            Err(err) => {
                log::error!("sync failed: {err}");
                let message = err.to_string();
                self.set_state(|s| {
                    s.is_syncing = false;
                    s.error = Some(message);
                });
            }
        }
    }

    /// Upload local decks and streak, reconcile remotely, and apply the
    /// merged result back to the local store.
    pub fn push(&self) -> Result<SyncReport> {
        let _guard = self.begin()?;
        let outcome = self.run_push();
        self.finish(&outcome);
        outcome
    }

    fn run_push(&self) -> Result<SyncReport> {
        let started = Instant::now();

        let (local_decks, local_streak) = {
            let store = self.store.lock().unwrap();
            (store.decks().to_vec(), store.streak().clone())
        };

        log::info!("pushing {} decks to remote", local_decks.len());
        let merged_decks = self.client.sync_decks(&local_decks)?;
        let merged_streak = self.client.sync_streak(&local_streak)?;

        // Remote batch committed; now fold the merged result into local
        // state as one atomic replacement.
        let mut store = self.store.lock().unwrap();
        store.replace_all(merged_decks)?;
        store.set_streak(merged_streak.clone())?;

        Ok(SyncReport {
            decks_synced: store.decks().len(),
            streak: merged_streak,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Download the remote collection and streak, replacing local state.
    pub fn pull(&self) -> Result<SyncReport> {
        let _guard = self.begin()?;
        let outcome = self.run_pull();
        self.finish(&outcome);
        outcome
    }

    fn run_pull(&self) -> Result<SyncReport> {
        let started = Instant::now();

        let remote_decks = self.client.fetch_decks()?;
        let remote_streak = self.client.fetch_streak()?;
        log::info!("pulled {} decks from remote", remote_decks.len());

        let mut store = self.store.lock().unwrap();
        store.replace_all(remote_decks)?;
        store.set_streak(remote_streak.clone())?;

        Ok(SyncReport {
            decks_synced: store.decks().len(),
            streak: remote_streak,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NullBackend;

    fn service() -> SyncService {
        let store = Arc::new(Mutex::new(
            DeckStore::open(Box::new(NullBackend)).unwrap(),
        ));
        let client = ApiClient::new("http://localhost:0", "token", None).unwrap();
        SyncService::new(store, client)
    }

    #[test]
    fn only_one_sync_in_flight() {
        let service = service();
        let guard = service.begin().unwrap();
        assert!(matches!(service.begin(), Err(SyncError::InProgress)));
        drop(guard);
        // Releasing the guard allows the next attempt.
        assert!(service.begin().is_ok());
    }

    #[test]
    fn failed_sync_records_error_and_clears_flag() {
        let service = service();
        // Nothing listens on localhost:0, so the push fails fast.
        let result = service.push();
        assert!(result.is_err());

        let state = service.state();
        assert!(!state.is_syncing);
        assert!(state.error.is_some());
        assert!(state.last_sync_at.is_none());

        // The guard was released; a retry is accepted (and fails the
        // same way rather than with InProgress).
        assert!(!matches!(service.push(), Err(SyncError::InProgress)));
    }

    #[test]
    fn listeners_observe_state_transitions() {
        let service = service();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        service.subscribe(move |state| {
            sink.lock().unwrap().push(state.is_syncing);
        });

        let _ = service.push();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[true, false]);
    }
}
