use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine as _;
use std::sync::Arc;

use super::{GenerateRequest, HealthResponse};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::tts::MODEL_NAME;

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    // Validate input; the error bodies are part of the wire contract.
    if request.text.is_empty() {
        return Err(AppError::BadRequest("no text".into()));
    }

    if request.voice_b64.is_empty() {
        return Err(AppError::BadRequest("no voice audio".into()));
    }

    let voice_bytes = base64::engine::general_purpose::STANDARD
        .decode(&request.voice_b64)
        .map_err(|e| AppError::Audio(format!("invalid base64 voice sample: {e}")))?;

    tracing::info!(
        text_chars = request.text.chars().count(),
        voice_bytes = voice_bytes.len(),
        language = %request.language,
        exaggeration = request.exaggeration,
        "synthesis request"
    );

    // Normalization and model inference both block; keep them off the
    // async workers.
    let text = request.text;
    let exaggeration = request.exaggeration;
    let wav = tokio::task::spawn_blocking(move || {
        state.tts.synthesize(&text, voice_bytes, exaggeration)
    })
    .await
    .map_err(|e| AppError::Engine(format!("task join error: {e}")))??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        wav,
    )
        .into_response())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: MODEL_NAME.to_string(),
    })
}

/// CORS preflight for browser clients recording voice samples in-page.
pub async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS, GET"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    )
        .into_response()
}
