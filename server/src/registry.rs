//! Live connections and the optional session identity each one joined with.

use std::collections::{HashMap, HashSet};

use syncboard_shared::ServerMessage;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub type ConnectionId = Uuid;
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

const MAX_SESSION_ID_LEN: usize = 128;

pub struct Connection {
    pub session_id: Option<String>,
    outbound: Outbound,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. Re-registering an id replaces the old entry.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        session_id: Option<String>,
        outbound: Outbound,
    ) {
        let connection = Connection {
            session_id: session_id.as_deref().and_then(normalize_session_id),
            outbound,
        };
        self.connections
            .write()
            .await
            .insert(connection_id, connection);
    }

    /// Returns whether the connection was registered. Unknown ids are a no-op.
    pub async fn deregister(&self, connection_id: ConnectionId) -> bool {
        self.connections
            .write()
            .await
            .remove(&connection_id)
            .is_some()
    }

    pub async fn evict(&self, connection_ids: &[ConnectionId]) {
        let mut connections = self.connections.write().await;
        for connection_id in connection_ids {
            connections.remove(connection_id);
        }
    }

    pub async fn distinct_session_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter_map(|connection| connection.session_id.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }

    pub async fn contains(&self, connection_id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&connection_id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Outbound senders of every connection except `except`, captured under a
    /// single read lock.
    pub async fn recipients(&self, except: Option<ConnectionId>) -> Vec<(ConnectionId, Outbound)> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(id, _)| Some(**id) != except)
            .map(|(id, connection)| (*id, connection.outbound.clone()))
            .collect()
    }
}

fn normalize_session_id(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.len() > MAX_SESSION_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
