use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Runtime settings, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Hugging Face token handed to the model worker for weight downloads.
    pub hf_token: String,
    /// Command that starts the Chatterbox worker process.
    pub runner: String,
    pub ffmpeg_path: String,
    /// Directory for short-lived voice samples and synthesis output.
    pub scratch_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("invalid PORT: {e}")))?;

        let hf_token = env::var("HF_TOKEN").map_err(|_| {
            AppError::Config("HF_TOKEN is required to fetch model weights".to_string())
        })?;

        let scratch_dir = env::var("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir());

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            hf_token,
            runner: env::var("CHATTERBOX_RUNNER")
                .unwrap_or_else(|_| "chatterbox-runner".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            scratch_dir,
        })
    }
}
