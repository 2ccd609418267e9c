//! Per-connection protocol handler.
//!
//! A session moves `Connecting -> Active -> Closed`. Opening registers the
//! connection and queues the history snapshot for it alone; while active,
//! draws are appended and relayed to everyone else and clears go to everyone.
//! Draws are fire-and-forget: the sender already rendered the stroke, so
//! nothing is ever reported back to it.

use std::sync::Arc;

use syncboard_shared::{ClientMessage, DrawPayload, Segment, ServerMessage};
use tracing::{debug, info};

use crate::registry::{ConnectionId, Outbound};
use crate::router::Delivery;
use crate::state::Canvas;

pub const MAX_COLOR_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

pub struct SyncSession {
    canvas: Arc<Canvas>,
    connection_id: ConnectionId,
    session_id: Option<String>,
    state: SessionState,
}

impl SyncSession {
    pub fn new(canvas: Arc<Canvas>, connection_id: ConnectionId, session_id: Option<String>) -> Self {
        Self {
            canvas,
            connection_id,
            session_id,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub async fn open(&mut self, outbound: Outbound) {
        if self.state != SessionState::Connecting {
            return;
        }
        let history_len = {
            // Registering under the history lock means every draw is either in
            // the snapshot or arrives after it, never both.
            let history = self.canvas.history.lock().await;
            self.canvas
                .registry
                .register(self.connection_id, self.session_id.clone(), outbound.clone())
                .await;
            let snapshot = history.snapshot();
            let history_len = snapshot.len();
            let _ = outbound.send(ServerMessage::Snapshot(snapshot));
            history_len
        };
        self.state = SessionState::Active;
        info!(
            conn = %self.connection_id,
            session = self.session_id.as_deref().unwrap_or("-"),
            operations = history_len,
            "session opened"
        );

        if self.canvas.presence.refresh().await.is_none() {
            let count = self.canvas.presence.current().await;
            let _ = outbound.send(ServerMessage::Presence(count));
        }
    }

    pub async fn handle(&mut self, message: ClientMessage) {
        if self.state != SessionState::Active {
            debug!(conn = %self.connection_id, state = ?self.state, "message outside active session dropped");
            return;
        }
        match message {
            ClientMessage::Draw(payload) => self.draw(payload).await,
            ClientMessage::Clear => self.clear().await,
        }
    }

    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.canvas.registry.deregister(self.connection_id).await;
        self.canvas.presence.refresh().await;
        info!(conn = %self.connection_id, "session closed");
    }

    async fn draw(&self, payload: DrawPayload) {
        if let Err(reason) = validate_payload(&payload) {
            debug!(conn = %self.connection_id, reason, "malformed draw dropped");
            return;
        }
        let delivery = {
            let mut history = self.canvas.history.lock().await;
            let sequences = history.append(payload.segments().iter().cloned());
            debug!(conn = %self.connection_id, first = sequences.start, count = payload.len(), "draw appended");
            self.canvas
                .router
                .broadcast_except(self.connection_id, ServerMessage::Draw(payload))
                .await
        };
        self.after_delivery(delivery).await;
    }

    async fn clear(&self) {
        let delivery = {
            let mut history = self.canvas.history.lock().await;
            history.clear();
            self.canvas.router.broadcast_all(ServerMessage::Clear).await
        };
        info!(conn = %self.connection_id, delivered = delivery.delivered, "canvas cleared");
        self.after_delivery(delivery).await;
    }

    async fn after_delivery(&self, delivery: Delivery) {
        if delivery.evicted > 0 {
            self.canvas.presence.refresh().await;
        }
    }
}

fn validate_payload(payload: &DrawPayload) -> Result<(), &'static str> {
    if payload.is_empty() {
        return Err("empty batch");
    }
    payload.segments().iter().try_for_each(validate_segment)
}

fn validate_segment(segment: &Segment) -> Result<(), &'static str> {
    if !segment.previous_point.is_finite() || !segment.current_point.is_finite() {
        return Err("non-finite point");
    }
    if !segment.stroke_width.is_finite() || segment.stroke_width <= 0.0 {
        return Err("invalid stroke width");
    }
    if segment.color.is_empty() || segment.color.len() > MAX_COLOR_LEN {
        return Err("invalid color");
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
