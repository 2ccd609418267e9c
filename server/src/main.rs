use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use syncboard_server::config::{Args, Backend};
use syncboard_server::persistence::{flush, load_history, spawn_flush_task};
use syncboard_server::state::AppState;
use syncboard_server::storage::{FileStorage, S3Storage, Storage};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let storage: Option<Arc<dyn Storage>> = match args.backend() {
        Backend::Memory => {
            info!("history backend: memory only");
            None
        }
        Backend::File(dir) => {
            info!(dir = %dir.display(), "history backend: file");
            Some(Arc::new(FileStorage::new(dir, args.canvas_name.clone())))
        }
        Backend::S3(config) => {
            info!(bucket = %config.bucket, "history backend: s3");
            Some(Arc::new(S3Storage::connect(&config, &args.canvas_name).await))
        }
    };

    let history = load_history(storage.as_deref(), args.history_cap).await;
    let state = AppState::new(history, storage);
    let flush_task = spawn_flush_task(state.clone(), args.flush_interval());

    let app = syncboard_server::app(state.clone(), &args.cors_origins());
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(port = args.port, "syncboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    flush_task.abort();
    flush(&state).await;
    info!("shut down");
    Ok(())
}
