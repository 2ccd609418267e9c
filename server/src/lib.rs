//! Real-time synchronization server for a shared drawing canvas.

pub mod codec;
pub mod config;
pub mod handlers;
pub mod history;
pub mod persistence;
pub mod presence;
pub mod registry;
pub mod router;
pub mod state;
pub mod storage;
pub mod sync;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers::{history_handler, ping_handler, ws_handler};
use crate::state::AppState;

pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(cors_origins))
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/history", get(history_handler))
        .route("/ping", get(ping_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn allowed_origins(cors_origins: &[String]) -> AllowOrigin {
    if cors_origins.iter().any(|origin| origin == "*") {
        return AllowOrigin::any();
    }
    AllowOrigin::list(cors_origins.iter().filter_map(|origin| {
        HeaderValue::from_str(origin)
            .map_err(|_| warn!(origin = %origin, "ignoring invalid CORS origin"))
            .ok()
    }))
}
