use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use syncboard_shared::{DrawOperation, ServerMessage, WireFormat};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec;
use crate::persistence;
use crate::state::AppState;
use crate::sync::SyncSession;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub session_id: Option<String>,
    #[serde(default)]
    pub format: WireFormat,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryDump {
    pub count: usize,
    pub history: Vec<DrawOperation>,
}

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Read-only view of the current history, for debugging.
pub async fn history_handler(State(state): State<AppState>) -> Json<HistoryDump> {
    let history = state.canvas.history.lock().await.snapshot();
    Json(HistoryDump {
        count: history.len(),
        history,
    })
}

pub async fn ws_handler(
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(socket: WebSocket, state: AppState, params: ConnectParams) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection_id = Uuid::new_v4();
    let format = params.format;

    let mut session = SyncSession::new(state.canvas.clone(), connection_id, params.session_id);
    session.open(tx).await;

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = match codec::encode(format, &message) {
                Ok(frame) => frame,
                Err(error) => {
                    warn!(conn = %connection_id, error = %error, "failed to encode outbound message");
                    continue;
                }
            };
            if socket_sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut close_frame = None;
    while let Some(Ok(message)) = socket_receiver.next().await {
        if let Message::Close(frame) = message {
            close_frame = frame;
            break;
        }
        match codec::decode(&message) {
            Some(Ok(client_message)) => session.handle(client_message).await,
            Some(Err(error)) => {
                debug!(conn = %connection_id, error = %error, "undecodable frame dropped");
            }
            None => {}
        }
    }

    session.close().await;
    send_task.abort();
    if let Some(frame) = &close_frame {
        debug!(conn = %connection_id, code = frame.code, reason = %frame.reason, "close frame");
    }

    if state.canvas.registry.is_empty().await && persistence::flush(&state).await {
        info!("history saved after last connection left");
    }
}
