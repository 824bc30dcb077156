//! Audio file loading and saving.
//!
//! `.wav` inputs decode directly through hound; every other allow-listed
//! format is transcoded to a staged 16 kHz mono WAV by the host's `ffmpeg`
//! and decoded from there. The staging file lives inside a
//! [`tempfile::NamedTempFile`] guard, so it is removed on every exit path,
//! including decode failures.

use std::path::Path;
use std::process::Command;

use tracing::info;

use super::buffer::AudioBuffer;
use crate::error::{Error, Result};

/// Fixed allow-list of supported file extensions.
pub const SUPPORTED_FORMATS: &[&str] =
    &["wav", "mp3", "flac", "ogg", "m4a", "wma", "aac", "opus"];

/// Load an audio file into a canonical buffer.
///
/// # Errors
/// - [`Error::UnsupportedFormat`] for extensions outside the allow-list
/// - [`Error::Decode`] for corrupt/unreadable files or converter failure
pub fn load_audio_file(path: &Path) -> Result<AudioBuffer> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !SUPPORTED_FORMATS.contains(&extension.as_str()) {
        return Err(Error::UnsupportedFormat(extension));
    }

    if extension == "wav" {
        let buffer = decode_wav(path)?;
        info!(path = %path.display(), "loaded WAV file");
        return Ok(buffer);
    }

    info!(path = %path.display(), "converting .{extension} to WAV");
    let staged = stage_converted_wav(path, &std::env::temp_dir())?;
    let buffer = decode_wav(staged.path())?;
    info!(path = %path.display(), "loaded and converted file");
    Ok(buffer)
    // `staged` drops here and removes the conversion artifact.
}

/// Serialize a buffer to a PCM WAV file at `path`. The input is not altered.
pub fn save_audio_file(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    info!(path = %path.display(), "audio saved");
    Ok(())
}

/// Decode a WAV container and normalize it.
///
/// Accepts int 16/24/32 and float sample formats; everything is scaled into
/// [-1, 1] before normalization.
fn decode_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    AudioBuffer::normalize(&samples, spec.sample_rate, spec.channels)
}

/// Transcode `input` into a temporary 16 kHz mono WAV under `staging_dir`.
///
/// The returned guard deletes the staged file when dropped, whether or not
/// decoding succeeds afterwards.
fn stage_converted_wav(input: &Path, staging_dir: &Path) -> Result<tempfile::NamedTempFile> {
    let staged = tempfile::Builder::new()
        .prefix("hark_convert_")
        .suffix(".wav")
        .tempfile_in(staging_dir)?;

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-i"])
        .arg(input)
        .args(["-ac", "1", "-ar", "16000", "-f", "wav", "-y"])
        .arg(staged.path())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Decode("ffmpeg not found on PATH (required for non-WAV inputs)".into())
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Decode(format!(
            "ffmpeg conversion failed: {}",
            stderr.trim()
        )));
    }

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn rejects_extensions_outside_the_allow_list() {
        let result = load_audio_file(Path::new("notes.txt"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(ext)) if ext == "txt"));

        let result = load_audio_file(Path::new("noext"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(ext)) if ext.is_empty()));
    }

    #[test]
    fn missing_wav_is_a_decode_or_io_error() {
        let result = load_audio_file(Path::new("/nonexistent/clip.wav"));
        assert!(result.is_err());
    }

    #[test]
    fn wav_load_normalizes_to_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 44_100, 2, 44_100);

        let buffer = load_audio_file(&path).unwrap();
        assert_eq!(buffer.sample_rate(), CANONICAL_SAMPLE_RATE);
        assert_eq!(buffer.channels(), CANONICAL_CHANNELS);
    }

    #[test]
    fn save_then_load_round_trips_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let original = AudioBuffer::from_canonical((0..16_000).map(|i| i as i16).collect());
        save_audio_file(&original, &path).unwrap();

        let reloaded = load_audio_file(&path).unwrap();
        assert_eq!(reloaded.samples().len(), original.samples().len());
    }

    #[test]
    fn failed_conversion_leaves_no_staged_file() {
        let input_dir = tempfile::tempdir().unwrap();
        let staging_dir = tempfile::tempdir().unwrap();

        // Garbage bytes: whether ffmpeg is missing or chokes on the input,
        // staging must come out empty.
        let input = input_dir.path().join("broken.mp3");
        std::fs::write(&input, b"this is not an mp3").unwrap();

        let result = stage_converted_wav(&input, staging_dir.path());
        if let Ok(staged) = result {
            drop(staged);
        }
        let leftovers: Vec<_> = std::fs::read_dir(staging_dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn successful_staging_cleans_up_on_drop() {
        let staging_dir = tempfile::tempdir().unwrap();
        let staged = tempfile::Builder::new()
            .prefix("hark_convert_")
            .suffix(".wav")
            .tempfile_in(staging_dir.path())
            .unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }
}
