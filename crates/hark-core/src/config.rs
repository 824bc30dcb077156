//! Configuration surface for capture and recognition.
//!
//! Settings are plain in-memory values with serde derives so a host can
//! embed them in its own configuration; nothing here reads or writes files.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::CANONICAL_SAMPLE_RATE;
use crate::error::Error;

/// Recognized options for a capture + recognition session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Engine identifier; validated against the closed set by
    /// [`crate::engine::build_engine`].
    pub engine: String,

    /// Language tag. `None` selects the engine's default language.
    #[serde(default)]
    pub language: Option<String>,

    /// Sample rate requested from the capture device.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Bounded capture duration in seconds.
    #[serde(default = "default_capture_duration")]
    pub capture_duration: u32,

    /// Capture device name (None = system default).
    #[serde(default)]
    pub capture_device: Option<String>,

    #[serde(default)]
    pub cloud: CloudSettings,

    #[serde(default)]
    pub local: LocalSettings,

    #[serde(default)]
    pub neural: NeuralSettings,
}

fn default_sample_rate() -> u32 {
    CANONICAL_SAMPLE_RATE
}

fn default_capture_duration() -> u32 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: "cloud-api".to_string(),
            language: None,
            sample_rate: default_sample_rate(),
            capture_duration: default_capture_duration(),
            capture_device: None,
            cloud: CloudSettings::default(),
            local: LocalSettings::default(),
            neural: NeuralSettings::default(),
        }
    }
}

/// Cloud recognition service options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSettings {
    /// Transcription endpoint (OpenAI-compatible multipart API).
    #[serde(default = "default_cloud_endpoint")]
    pub endpoint: String,

    /// API key; falls back to the `HARK_CLOUD_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_cloud_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            endpoint: default_cloud_endpoint(),
            api_key: None,
        }
    }
}

/// Local decoder runtime options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Decoder binary (None = `pocketsphinx_continuous` on PATH).
    #[serde(default)]
    pub decoder_path: Option<PathBuf>,
}

/// Neural inference options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeuralSettings {
    /// Model cache directory (None = platform default).
    #[serde(default)]
    pub models_dir: Option<PathBuf>,

    /// Compute device binding.
    #[serde(default)]
    pub device: DeviceBinding,
}

/// Compute device binding for the neural engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBinding {
    /// Prefer the platform accelerator, fall back to CPU.
    #[default]
    Auto,
    /// General-purpose processor only.
    Cpu,
    /// Pin to the platform accelerator; fail if it is unavailable.
    Accelerated,
}

impl DeviceBinding {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceBinding::Auto => "auto",
            DeviceBinding::Cpu => "cpu",
            DeviceBinding::Accelerated => "accelerated",
        }
    }
}

impl fmt::Display for DeviceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceBinding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(DeviceBinding::Auto),
            "cpu" => Ok(DeviceBinding::Cpu),
            "accelerated" => Ok(DeviceBinding::Accelerated),
            _ => Err(Error::Configuration(format!(
                "unknown device binding '{s}', available: auto, cpu, accelerated"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_capture_contract() {
        let settings = Settings::default();
        assert_eq!(settings.engine, "cloud-api");
        assert_eq!(settings.sample_rate, 16_000);
        assert_eq!(settings.capture_duration, 5);
        assert!(settings.language.is_none());
        assert_eq!(settings.neural.device, DeviceBinding::Auto);
    }

    #[test]
    fn device_binding_parses_known_identifiers() {
        assert_eq!("auto".parse::<DeviceBinding>().unwrap(), DeviceBinding::Auto);
        assert_eq!("CPU".parse::<DeviceBinding>().unwrap(), DeviceBinding::Cpu);
        assert_eq!(
            "accelerated".parse::<DeviceBinding>().unwrap(),
            DeviceBinding::Accelerated
        );
        assert!("gpu".parse::<DeviceBinding>().is_err());
    }

    #[test]
    fn settings_deserialize_with_partial_input() {
        let settings: Settings =
            serde_json::from_str(r#"{"engine": "neural-inference"}"#).unwrap();
        assert_eq!(settings.engine, "neural-inference");
        assert_eq!(settings.sample_rate, 16_000);
        assert_eq!(settings.neural.device, DeviceBinding::Auto);
    }
}
