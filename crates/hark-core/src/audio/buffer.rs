//! Canonical in-memory audio representation.

use std::io::Cursor;

use crate::error::Result;
use crate::resample;

/// Sample rate every recognition backend consumes.
pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;

/// Channel count every recognition backend consumes.
pub const CANONICAL_CHANNELS: u16 = 1;

/// Normalized PCM audio: mono, 16 kHz, signed 16-bit.
///
/// Buffers are only built through the normalizing constructors, so any buffer
/// handed to a recognition engine is guaranteed canonical and engines never
/// perform their own resampling. A buffer is immutable after creation and is
/// owned by the caller that requests recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Normalize raw interleaved f32 samples into the canonical format.
    pub fn normalize(samples: &[f32], source_rate: u32, channels: u16) -> Result<Self> {
        let mono = resample::resample_to_canonical(samples, source_rate, channels)?;
        let samples = mono
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect();
        Ok(Self {
            samples,
            sample_rate: CANONICAL_SAMPLE_RATE,
            channels: CANONICAL_CHANNELS,
        })
    }

    /// Wrap samples that are already canonical mono 16 kHz PCM.
    pub fn from_canonical(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: CANONICAL_SAMPLE_RATE,
            channels: CANONICAL_CHANNELS,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds, derived from sample count and rate.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Samples scaled into [-1, 1] for tensor input.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }

    /// Encode the buffer as an in-memory PCM WAV container.
    pub fn wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_canonical_format() {
        let stereo_44k = vec![0.1f32; 44_100 * 2];
        let buffer = AudioBuffer::normalize(&stereo_44k, 44_100, 2).unwrap();
        assert_eq!(buffer.sample_rate(), CANONICAL_SAMPLE_RATE);
        assert_eq!(buffer.channels(), CANONICAL_CHANNELS);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn duration_derives_from_sample_count() {
        let buffer = AudioBuffer::from_canonical(vec![0i16; 32_000]);
        assert!((buffer.duration_secs() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn to_f32_maps_int_range_to_unit_interval() {
        let buffer = AudioBuffer::from_canonical(vec![0, i16::MAX, i16::MIN]);
        let scaled = buffer.to_f32();
        assert_eq!(scaled[0], 0.0);
        assert!((scaled[1] - 0.99997).abs() < 0.001);
        assert_eq!(scaled[2], -1.0);
    }

    #[test]
    fn wav_bytes_produces_a_parseable_container() {
        let buffer = AudioBuffer::from_canonical(vec![100i16; 1600]);
        let bytes = buffer.wav_bytes().unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, CANONICAL_SAMPLE_RATE);
        assert_eq!(spec.channels, CANONICAL_CHANNELS);
        assert_eq!(reader.len(), 1600);
    }
}
