//! Downmix and resampling to the canonical audio format.
//!
//! Every recognition backend consumes mono 16 kHz PCM. Capture and file
//! loading run through here exactly once, so engines never resample.

use rubato::{FftFixedIn, Resampler};

use crate::audio::CANONICAL_SAMPLE_RATE;
use crate::error::{Error, Result};

/// Resample interleaved audio to 16 kHz mono.
///
/// # Arguments
/// * `samples` - Input samples (any sample rate, any channel count)
/// * `source_rate` - Source sample rate in Hz
/// * `channels` - Number of interleaved channels in the input
pub fn resample_to_canonical(
    samples: &[f32],
    source_rate: u32,
    channels: u16,
) -> Result<Vec<f32>> {
    if source_rate == 0 || channels == 0 {
        return Err(Error::Decode(format!(
            "invalid source format: {source_rate} Hz, {channels} channel(s)"
        )));
    }

    let mono = if channels > 1 {
        downmix_to_mono(samples, channels)
    } else {
        samples.to_vec()
    };

    if source_rate == CANONICAL_SAMPLE_RATE {
        return Ok(mono);
    }

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        CANONICAL_SAMPLE_RATE as usize,
        1024, // chunk size
        2,    // sub-chunks
        1,    // mono
    )
    .map_err(|e| Error::Decode(format!("failed to create resampler: {e}")))?;

    let mut output = Vec::new();
    let chunk_size = resampler.input_frames_max();

    for chunk in mono.chunks(chunk_size) {
        let mut padded = chunk.to_vec();
        if padded.len() < chunk_size {
            padded.resize(chunk_size, 0.0);
        }

        let result = resampler
            .process(&[padded], None)
            .map_err(|e| Error::Decode(format!("resampling failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output)
}

/// Convert multichannel audio to mono by averaging all channels.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let stereo = vec![0.5, 0.3, 0.8, 0.2, 1.0, 0.0];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.5).abs() < 0.001);
        assert!((mono[2] - 0.5).abs() < 0.001);
    }

    #[test]
    fn passthrough_at_canonical_rate() {
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let result = resample_to_canonical(&samples, 16000, 1).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn stereo_at_canonical_rate_only_downmixes() {
        let stereo = vec![0.2, 0.4, 0.6, 0.8];
        let result = resample_to_canonical(&stereo, 16000, 2).unwrap();
        assert_eq!(result.len(), 2);
        assert!((result[0] - 0.3).abs() < 0.001);
    }

    #[test]
    fn resampling_halves_sample_count_from_32k() {
        let samples = vec![0.0f32; 32_000];
        let result = resample_to_canonical(&samples, 32_000, 1).unwrap();
        // Chunk padding may append a tail; the count must be close to half.
        assert!(result.len() >= 16_000);
        assert!(result.len() < 17_000);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample_to_canonical(&[0.0], 0, 1).is_err());
    }
}
