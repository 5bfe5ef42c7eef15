pub mod chatterbox;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio;
use crate::error::AppError;

pub use chatterbox::ChatterboxEngine;

/// Model name reported by the health endpoint.
pub const MODEL_NAME: &str = "chatterbox";

/// One synthesized utterance: mono samples at the model's intrinsic rate.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// The voice-cloning model behind a narrow seam.
///
/// The model wants its reference audio as a file on disk, so engines take a
/// path rather than bytes. `exaggeration` is forwarded verbatim.
pub trait SynthesisEngine: Send + Sync {
    fn generate(
        &self,
        text: &str,
        reference: &Path,
        exaggeration: f32,
    ) -> Result<Synthesis, AppError>;
}

pub struct TtsService {
    engine: Arc<dyn SynthesisEngine>,
    ffmpeg_path: String,
    scratch_dir: PathBuf,
}

impl TtsService {
    pub fn new(engine: Arc<dyn SynthesisEngine>, ffmpeg_path: String, scratch_dir: PathBuf) -> Self {
        Self {
            engine,
            ffmpeg_path,
            scratch_dir,
        }
    }

    /// Clone the reference voice and speak `text`, returning WAV bytes.
    ///
    /// The normalized reference exists on disk only while the model runs;
    /// the tempfile guard removes it on every exit path, including errors.
    pub fn synthesize(
        &self,
        text: &str,
        voice_bytes: Vec<u8>,
        exaggeration: f32,
    ) -> Result<Vec<u8>, AppError> {
        // 1. Normalize the voice sample (WAV passes through untouched)
        let reference =
            audio::normalize_voice_sample(voice_bytes, &self.ffmpeg_path, &self.scratch_dir)?;

        // 2. Stage it where the model can read it
        let mut prompt = tempfile::Builder::new()
            .prefix("voice-ref-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)?;
        prompt.write_all(&reference)?;
        prompt.flush()?;

        // 3. Synthesize
        let synthesis = self.engine.generate(text, prompt.path(), exaggeration)?;

        // 4. Encode WAV
        audio::encode_wav(&synthesis.samples, synthesis.sample_rate)
    }
}
