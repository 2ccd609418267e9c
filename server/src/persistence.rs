//! Best-effort persistence of the canvas history.
//!
//! The live session never waits on storage. A flush copies the history out
//! under the lock, saves without it, and re-arms the dirty flag on failure so
//! the next tick retries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::history::HistoryStore;
use crate::state::AppState;
use crate::storage::{Storage, StorageError};

/// Loads the stored history, falling back to an empty canvas.
pub async fn load_history(storage: Option<&dyn Storage>, cap: usize) -> HistoryStore {
    let Some(storage) = storage else {
        return HistoryStore::new(cap);
    };
    match storage.load_history().await {
        Ok(data) => {
            let store = HistoryStore::restore(data, cap);
            info!(operations = store.len(), next_sequence = store.next_sequence(), "history restored");
            store
        }
        Err(StorageError::NotFound) => {
            info!("no stored history, starting empty");
            HistoryStore::new(cap)
        }
        Err(error) => {
            warn!(error = %error, "failed to load history, starting empty");
            HistoryStore::new(cap)
        }
    }
}

/// Saves the history if it changed. Returns whether a save succeeded.
pub async fn flush(state: &AppState) -> bool {
    let Some(storage) = state.storage.as_ref() else {
        return false;
    };
    let Some(data) = state.canvas.history.lock().await.take_dirty() else {
        return false;
    };
    match storage.save_history(&data).await {
        Ok(()) => {
            info!(operations = data.operations.len(), "history saved");
            true
        }
        Err(error) => {
            error!(error = %error, "failed to save history");
            state.canvas.history.lock().await.mark_dirty();
            false
        }
    }
}

pub fn spawn_flush_task(state: AppState, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "history flush configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            flush(&state).await;
        }
    })
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
