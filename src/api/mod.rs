pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

/// Body of `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: String,
    /// Base64 (standard alphabet) reference voice sample.
    #[serde(default)]
    pub voice_b64: String,
    /// Accepted and logged, but the model decides language from the text.
    #[serde(default = "default_language")]
    pub language: String,
    /// Emotion intensity, forwarded to the model unclamped.
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_exaggeration() -> f32 {
    0.5
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}
