//! Reference-audio handling: WAV decode/encode, channel downmix, and
//! normalization of browser-recorded voice samples into the format the
//! model expects.

pub mod resample;

use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::AppError;

/// RIFF magic marking a voice sample that is already WAV.
pub const WAV_MAGIC: &[u8; 4] = b"RIFF";

/// Sample rate Chatterbox expects for reference audio.
pub const TARGET_SAMPLE_RATE: u32 = 24_000;

/// Decoded PCM audio in its source layout.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Prepare a reference voice sample for the model.
///
/// WAV input (RIFF magic) is trusted as-is and passed through untouched.
/// Anything else, typically a WebM/Opus capture from a browser recorder,
/// is decoded with ffmpeg and collapsed to mono 24 kHz WAV.
pub fn normalize_voice_sample(
    bytes: Vec<u8>,
    ffmpeg_path: &str,
    scratch_dir: &Path,
) -> Result<Vec<u8>, AppError> {
    if bytes.starts_with(WAV_MAGIC) {
        return Ok(bytes);
    }

    let decoded = decode_compressed(&bytes, ffmpeg_path, scratch_dir)?;
    normalize_decoded(decoded)
}

/// Collapse decoded audio to mono 24 kHz 16-bit PCM WAV.
pub fn normalize_decoded(decoded: DecodedAudio) -> Result<Vec<u8>, AppError> {
    let mono = downmix_to_mono(&decoded.samples, decoded.channels);
    let mono = if decoded.sample_rate != TARGET_SAMPLE_RATE {
        resample::resample(&mono, decoded.sample_rate, TARGET_SAMPLE_RATE)?
    } else {
        mono
    };
    encode_wav(&mono, TARGET_SAMPLE_RATE)
}

/// Decode a compressed or containerized clip by shelling out to ffmpeg,
/// preserving the source sample rate and channel count.
pub fn decode_compressed(
    bytes: &[u8],
    ffmpeg_path: &str,
    scratch_dir: &Path,
) -> Result<DecodedAudio, AppError> {
    let src = tempfile::Builder::new()
        .prefix("voice-src-")
        .suffix(".bin")
        .tempfile_in(scratch_dir)?;
    std::fs::write(src.path(), bytes)?;

    let dst = tempfile::Builder::new()
        .prefix("voice-dec-")
        .suffix(".wav")
        .tempfile_in(scratch_dir)?;

    let output = Command::new(ffmpeg_path)
        .arg("-y")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(src.path())
        .arg(dst.path())
        .output()
        .map_err(|e| {
            AppError::Audio(format!("failed to run {ffmpeg_path} (is it installed?): {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Audio(format!(
            "could not decode voice sample: {}",
            stderr.trim()
        )));
    }

    let data = std::fs::read(dst.path())?;
    decode_wav(&data)
}

/// Parse WAV bytes into interleaved f32 samples.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, AppError> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| AppError::Audio(format!("invalid WAV data: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Audio(format!("bad WAV samples: {e}")))?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::Audio(format!("bad WAV samples: {e}")))?
        }
    };

    Ok(DecodedAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved channels into mono. Mono input is returned as-is.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Encode mono f32 samples as 16-bit PCM WAV bytes.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AppError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut writer = WavWriter::new(cursor, spec)
            .map_err(|e| AppError::Audio(format!("failed to create WAV writer: {e}")))?;

        for &sample in samples {
            let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| AppError::Audio(format!("failed to write sample: {e}")))?;
        }

        writer
            .finalize()
            .map_err(|e| AppError::Audio(format!("failed to finalize WAV: {e}")))?;
    }

    Ok(buffer)
}

/// Read a WAV file into mono samples plus its sample rate.
pub fn read_wav_file(path: &Path) -> Result<(Vec<f32>, u32), AppError> {
    let bytes = std::fs::read(path)?;
    let decoded = decode_wav(&bytes)?;
    let samples = downmix_to_mono(&decoded.samples, decoded.channels);
    Ok((samples, decoded.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interleaved_sine(rate: u32, channels: u16, seconds: f32) -> DecodedAudio {
        let frames = (rate as f32 * seconds) as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            let value = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin() * 0.5;
            for _ in 0..channels {
                samples.push(value);
            }
        }
        DecodedAudio {
            samples,
            channels,
            sample_rate: rate,
        }
    }

    #[test]
    fn test_downmix_averages_channels() {
        let samples = vec![0.2, 0.4, 0.6, 0.8];
        let mono = downmix_to_mono(&samples, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_downmix_mono_unchanged() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn test_encode_wav_produces_riff() {
        let wav = encode_wav(&[0.0, 0.5, -0.5], 24_000).unwrap();
        assert!(wav.starts_with(WAV_MAGIC));
        assert!(wav.len() > 44);
    }

    #[test]
    fn test_encode_clamps_out_of_range_samples() {
        let wav = encode_wav(&[2.0, -2.0], 24_000).unwrap();
        let decoded = decode_wav(&wav).unwrap();
        assert!(decoded.samples[0] > 0.99);
        assert!(decoded.samples[1] < -0.99);
    }

    #[test]
    fn test_decode_wav_reads_layout() {
        let stereo = interleaved_sine(16_000, 2, 0.1);
        let wav = {
            let spec = WavSpec {
                channels: 2,
                sample_rate: 16_000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            let mut buffer = Vec::new();
            let mut writer = WavWriter::new(Cursor::new(&mut buffer), spec).unwrap();
            for &s in &stereo.samples {
                writer.write_sample((s * 32767.0) as i16).unwrap();
            }
            writer.finalize().unwrap();
            buffer
        };

        let decoded = decode_wav(&wav).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.samples.len(), stereo.samples.len());
    }

    #[test]
    fn test_normalize_decoded_yields_mono_24k() {
        for source in [
            interleaved_sine(16_000, 2, 0.1),
            interleaved_sine(48_000, 1, 0.1),
            interleaved_sine(24_000, 2, 0.1),
        ] {
            let wav = normalize_decoded(source).unwrap();
            let decoded = decode_wav(&wav).unwrap();
            assert_eq!(decoded.channels, 1);
            assert_eq!(decoded.sample_rate, TARGET_SAMPLE_RATE);
            assert!(!decoded.samples.is_empty());
        }
    }

    #[test]
    fn test_normalize_passes_wav_through_untouched() {
        // A 16 kHz stereo WAV keeps its bytes; only non-WAV input is converted.
        let stereo = interleaved_sine(16_000, 2, 0.1);
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut wav = Vec::new();
        {
            let mut writer = WavWriter::new(Cursor::new(&mut wav), spec).unwrap();
            for &s in &stereo.samples {
                writer.write_sample((s * 32767.0) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let scratch = tempfile::tempdir().unwrap();
        let out = normalize_voice_sample(wav.clone(), "ffmpeg", scratch.path()).unwrap();
        assert_eq!(out, wav);
    }

    #[test]
    fn test_normalize_rejects_undecodable_bytes() {
        let scratch = tempfile::tempdir().unwrap();
        let result =
            normalize_voice_sample(b"definitely not audio".to_vec(), "ffmpeg", scratch.path());
        assert!(result.is_err());
    }
}
