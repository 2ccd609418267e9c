use std::sync::Arc;

use tokio::sync::Mutex;

use crate::history::HistoryStore;
use crate::presence::PresenceAggregator;
use crate::registry::ConnectionRegistry;
use crate::router::BroadcastRouter;
use crate::storage::Storage;

/// The single shared canvas: its history plus everyone currently looking at it.
///
/// Lock order is history, then registry. Draws and clears broadcast while the
/// history lock is held so every connection sees them in history order.
pub struct Canvas {
    pub history: Mutex<HistoryStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub router: BroadcastRouter,
    pub presence: PresenceAggregator,
}

impl Canvas {
    pub fn new(history: HistoryStore) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = BroadcastRouter::new(registry.clone());
        let presence = PresenceAggregator::new(registry.clone(), router.clone());
        Self {
            history: Mutex::new(history),
            registry,
            router,
            presence,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub canvas: Arc<Canvas>,
    pub storage: Option<Arc<dyn Storage>>,
}

impl AppState {
    pub fn new(history: HistoryStore, storage: Option<Arc<dyn Storage>>) -> Self {
        Self {
            canvas: Arc::new(Canvas::new(history)),
            storage,
        }
    }

    /// Memory-only state, used when no durable backend is configured.
    pub fn in_memory(cap: usize) -> Self {
        Self::new(HistoryStore::new(cap), None)
    }
}
