//! Chatterbox engine backed by a persistent worker process.
//!
//! The Chatterbox model ships as a Python package, so the server owns a
//! long-lived `chatterbox-runner` child and talks to it over line-delimited
//! JSON: one ready line once the weights are loaded, then one request/reply
//! pair per synthesis. The worker keeps the model on the GPU for the life
//! of the server.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::audio;
use crate::config::Config;
use crate::error::AppError;
use crate::tts::{Synthesis, SynthesisEngine};

#[derive(Debug, Serialize)]
struct WorkerRequest<'a> {
    text: &'a str,
    prompt_path: &'a Path,
    exaggeration: f32,
    out_path: &'a Path,
}

#[derive(Debug, Deserialize)]
struct WorkerReady {
    sample_rate: u32,
}

#[derive(Debug, Deserialize)]
struct WorkerReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

pub struct ChatterboxEngine {
    // The worker pipe is a single conversation; requests take turns.
    worker: Mutex<Worker>,
    scratch_dir: PathBuf,
}

impl ChatterboxEngine {
    /// Spawn the worker and block until the model is loaded.
    ///
    /// stderr is inherited so download and load progress lands in the
    /// server logs. A missing HF_TOKEN or a failed weight download
    /// surfaces here, before the server ever accepts a request.
    pub fn spawn(config: &Config) -> Result<Self, AppError> {
        tracing::info!("Starting Chatterbox runner: {}", config.runner);

        let mut child = Command::new(&config.runner)
            .env("HF_TOKEN", &config.hf_token)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AppError::Engine(format!(
                    "failed to start {} (is it installed?): {e}",
                    config.runner
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Engine("runner stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Engine("runner stdout unavailable".to_string()))?;
        let mut stdout = BufReader::new(stdout);

        let mut line = String::new();
        stdout.read_line(&mut line)?;
        if line.is_empty() {
            return Err(AppError::Engine(
                "runner exited before the model loaded".to_string(),
            ));
        }
        let ready: WorkerReady = serde_json::from_str(&line)?;
        tracing::info!("Chatterbox model loaded, sample rate {}", ready.sample_rate);

        Ok(Self {
            worker: Mutex::new(Worker {
                child,
                stdin,
                stdout,
            }),
            scratch_dir: config.scratch_dir.clone(),
        })
    }
}

impl SynthesisEngine for ChatterboxEngine {
    fn generate(
        &self,
        text: &str,
        reference: &Path,
        exaggeration: f32,
    ) -> Result<Synthesis, AppError> {
        let out = tempfile::Builder::new()
            .prefix("synth-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)?;

        let request = WorkerRequest {
            text,
            prompt_path: reference,
            exaggeration,
            out_path: out.path(),
        };
        let line = serde_json::to_string(&request)?;

        let reply_line = {
            let mut worker = self.worker.lock().unwrap();
            writeln!(worker.stdin, "{line}")?;
            worker.stdin.flush()?;

            let mut reply = String::new();
            worker.stdout.read_line(&mut reply)?;
            reply
        };

        if reply_line.is_empty() {
            return Err(AppError::Engine("runner exited during synthesis".to_string()));
        }
        let reply: WorkerReply = serde_json::from_str(&reply_line)?;
        if !reply.ok {
            return Err(AppError::Engine(
                reply.error.unwrap_or_else(|| "unknown runner error".to_string()),
            ));
        }

        let (samples, sample_rate) = audio::read_wav_file(out.path())?;
        Ok(Synthesis {
            samples,
            sample_rate,
        })
    }
}

impl Drop for ChatterboxEngine {
    fn drop(&mut self) {
        if let Ok(worker) = self.worker.get_mut() {
            let _ = worker.child.kill();
            let _ = worker.child.wait();
        }
    }
}
