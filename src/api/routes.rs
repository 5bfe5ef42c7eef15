use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::tts::TtsService;

pub struct AppState {
    pub tts: TtsService,
}

// Voice samples arrive base64-inflated inside the JSON body; axum's
// default 2 MB cap is too small for a few seconds of uncompressed audio.
const BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/generate",
            post(handlers::generate).options(handlers::preflight),
        )
        .route("/health", get(handlers::health).options(handlers::preflight))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
