use std::sync::Arc;

use syncboard_shared::ServerMessage;
use tokio::sync::Mutex;
use tracing::info;

use crate::registry::ConnectionRegistry;
use crate::router::BroadcastRouter;

/// Tracks the distinct-session count and announces it only when it moves.
pub struct PresenceAggregator {
    registry: Arc<ConnectionRegistry>,
    router: BroadcastRouter,
    last: Mutex<usize>,
}

impl PresenceAggregator {
    pub fn new(registry: Arc<ConnectionRegistry>, router: BroadcastRouter) -> Self {
        Self {
            registry,
            router,
            last: Mutex::new(0),
        }
    }

    /// Recomputes the count after a registration change. Returns the new count
    /// if it differed from the last announced one and was broadcast.
    pub async fn refresh(&self) -> Option<usize> {
        // Held across the broadcast so announcements go out in count order.
        let mut last = self.last.lock().await;
        let mut announced = None;
        loop {
            let count = self.registry.distinct_session_count().await;
            if count == *last {
                return announced;
            }
            *last = count;
            announced = Some(count);
            info!(count, "presence changed");
            // Announcing can evict closed connections, which may move the count again.
            let delivery = self.router.broadcast_all(ServerMessage::Presence(count)).await;
            if delivery.evicted == 0 {
                return announced;
            }
        }
    }

    pub async fn current(&self) -> usize {
        *self.last.lock().await
    }
}
