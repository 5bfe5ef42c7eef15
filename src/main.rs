use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod audio;
mod config;
mod error;
mod tts;

use api::routes::{create_router, AppState};
use config::Config;
use tts::{ChatterboxEngine, TtsService};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration from environment
    let config = Config::from_env().expect("Invalid configuration");

    std::fs::create_dir_all(&config.scratch_dir).expect("Cannot create scratch directory");

    tracing::info!("Chatterbox TTS Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Scratch directory: {}", config.scratch_dir.display());

    // Load the model before binding the listener; a live port means a
    // loaded model.
    let engine = Arc::new(ChatterboxEngine::spawn(&config).expect("Model load failed"));

    // Create TTS service
    let tts = TtsService::new(
        engine,
        config.ffmpeg_path.clone(),
        config.scratch_dir.clone(),
    );

    // Create app state
    let state = Arc::new(AppState { tts });

    // Create router
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid address");

    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
