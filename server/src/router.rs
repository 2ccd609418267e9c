use std::sync::Arc;

use syncboard_shared::ServerMessage;
use tracing::debug;

use crate::registry::{ConnectionId, ConnectionRegistry};

/// Outcome of one broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    /// Connections found closed and removed from the registry.
    pub evicted: usize,
}

/// Fans messages out to registered connections. Delivery is best effort: a
/// closed outbound channel is skipped and its connection evicted afterwards.
#[derive(Clone)]
pub struct BroadcastRouter {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers to every connection but `sender`. Callers that track presence
    /// must refresh it when `evicted` is non-zero.
    pub async fn broadcast_except(&self, sender: ConnectionId, message: ServerMessage) -> Delivery {
        self.deliver(Some(sender), message).await
    }

    /// Delivers to every connection, the sender included.
    pub async fn broadcast_all(&self, message: ServerMessage) -> Delivery {
        self.deliver(None, message).await
    }

    async fn deliver(&self, except: Option<ConnectionId>, message: ServerMessage) -> Delivery {
        let mut delivered = 0;
        let mut stale = Vec::new();
        for (id, tx) in self.registry.recipients(except).await {
            if tx.send(message.clone()).is_err() {
                stale.push(id);
            } else {
                delivered += 1;
            }
        }

        if !stale.is_empty() {
            debug!(count = stale.len(), "evicting closed connections");
            self.registry.evict(&stale).await;
        }
        Delivery {
            delivered,
            evicted: stale.len(),
        }
    }
}
