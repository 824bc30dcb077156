//! Offline statistical decoder backend.
//!
//! Drives the host's pocketsphinx runtime as a subprocess over a staged WAV
//! file. The runtime is an optional dependency: when it is missing or
//! unusable the engine returns the [`DECODER_UNAVAILABLE`] sentinel
//! transcript instead of raising, so a host without the decoder installed
//! keeps working.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use super::{EngineKind, RecognitionEngine};
use crate::audio::AudioBuffer;
use crate::config::LocalSettings;
use crate::error::Result;

/// Runtime binary probed on PATH when no explicit path is configured.
pub const DEFAULT_DECODER_BIN: &str = "pocketsphinx_continuous";

/// Returned as the transcript when the decoder runtime is absent.
pub const DECODER_UNAVAILABLE: &str = "[local decoder unavailable: install pocketsphinx]";

/// Offline decoder engine.
pub struct LocalDecoderEngine {
    decoder: PathBuf,
    language: String,
}

impl LocalDecoderEngine {
    /// The decoder holds no persistent resources; construction cannot fail
    /// and does not probe the runtime.
    pub fn new(settings: &LocalSettings, language: String) -> Self {
        let decoder = settings
            .decoder_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DECODER_BIN));
        Self { decoder, language }
    }
}

impl RecognitionEngine for LocalDecoderEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::LocalDecoder
    }

    fn recognize(&mut self, buffer: &AudioBuffer) -> Result<Option<String>> {
        info!(language = %self.language, "decoding with the local runtime");

        let mut staged = tempfile::Builder::new()
            .prefix("hark_decode_")
            .suffix(".wav")
            .tempfile()?;
        staged.write_all(&buffer.wav_bytes()?)?;
        staged.flush()?;

        let output = match Command::new(&self.decoder)
            .arg("-infile")
            .arg(staged.path())
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                warn!(decoder = %self.decoder.display(), "decoder runtime unavailable: {err}");
                return Ok(Some(DECODER_UNAVAILABLE.to_string()));
            }
        };

        if !output.status.success() {
            warn!(status = %output.status, "decoder runtime exited abnormally");
            return Ok(Some(DECODER_UNAVAILABLE.to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_runtime_yields_the_sentinel_not_an_error() {
        let settings = LocalSettings {
            decoder_path: Some("/nonexistent/hark-no-such-decoder".into()),
        };
        let mut engine = LocalDecoderEngine::new(&settings, "en-US".to_string());

        let buffer = AudioBuffer::from_canonical(vec![0i16; 1600]);
        let result = engine.recognize(&buffer).unwrap();

        assert_eq!(result.as_deref(), Some(DECODER_UNAVAILABLE));
    }

    #[test]
    fn default_binary_is_probed_from_path() {
        let engine = LocalDecoderEngine::new(&LocalSettings::default(), "en-US".to_string());
        assert_eq!(engine.decoder, PathBuf::from(DEFAULT_DECODER_BIN));
        assert_eq!(engine.kind(), EngineKind::LocalDecoder);
    }
}
