//! Sample-rate conversion for reference audio.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::AppError;

/// Resample mono audio with a windowed-sinc filter.
///
/// The whole clip is converted in one chunk; reference samples are a few
/// seconds long at most, so there is no need for streaming.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AppError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        samples.len(),
        1,
    )
    .map_err(|e| AppError::Audio(format!("failed to create resampler: {e}")))?;

    let mut output = resampler
        .process(&[samples], None)
        .map_err(|e| AppError::Audio(format!("resampling failed: {e}")))?;

    Ok(output.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, freq: f32, seconds: f32) -> Vec<f32> {
        let count = (rate as f32 * seconds) as usize;
        (0..count)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let input = sine(24_000, 440.0, 0.1);
        let output = resample(&input, 24_000, 24_000).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_resample_empty_input() {
        let output = resample(&[], 16_000, 24_000).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_upsample_16k_to_24k_length() {
        let input = sine(16_000, 440.0, 0.1);
        let output = resample(&input, 16_000, 24_000).unwrap();
        // 1600 samples * 1.5 = 2400, give or take the filter transient.
        assert!(output.len() > 2_000, "output too short: {}", output.len());
        assert!(output.len() < 3_000, "output too long: {}", output.len());
    }

    #[test]
    fn test_downsample_preserves_signal() {
        let input = sine(48_000, 440.0, 0.2);
        let output = resample(&input, 48_000, 24_000).unwrap();
        let peak = output.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.5, "signal lost in resampling: peak {peak}");
    }
}
