//! Recognition engines: a closed set of interchangeable backends behind one
//! contract.
//!
//! Selection is a validated mapping from identifier to constructor. The
//! cheap checks (identifier, language tag, credentials presence) always run
//! before any expensive resource is touched, so an invalid request can never
//! trigger a model download or a network client build.

mod cloud;
mod local;
mod neural;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::config::Settings;
use crate::error::{Error, Result};

pub use cloud::CloudApiEngine;
pub use local::{DECODER_UNAVAILABLE, LocalDecoderEngine};
pub use neural::NeuralEngine;

/// Uniform contract over the recognition backends.
///
/// `Ok(Some(text))` is a transcript; `Ok(None)` means the audio was processed
/// but no speech was understood; `Err` is an operational fault. Callers are
/// expected to react differently to the last two.
///
/// `recognize` takes `&mut self`: one engine instance serves one call at a
/// time, and whatever resources it holds (a loaded model, for the neural
/// variant) are reused across calls on the same instance.
pub trait RecognitionEngine: Send {
    /// Which variant this engine is.
    fn kind(&self) -> EngineKind;

    /// Transcribe a canonical audio buffer.
    fn recognize(&mut self, buffer: &AudioBuffer) -> Result<Option<String>>;
}

/// The closed set of recognition backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    CloudApi,
    LocalDecoder,
    NeuralInference,
}

/// Fixed metadata for one engine variant.
#[derive(Debug, Clone, Copy)]
pub struct EngineDescriptor {
    pub identifier: &'static str,
    pub display_name: &'static str,
    pub requires_network: bool,
    pub default_language: &'static str,
    pub supported_languages: &'static [&'static str],
}

impl EngineKind {
    /// Get the string identifier for this engine.
    pub fn as_str(&self) -> &'static str {
        self.descriptor().identifier
    }

    /// List all available engines.
    pub fn all() -> &'static [EngineKind] {
        &[
            EngineKind::CloudApi,
            EngineKind::LocalDecoder,
            EngineKind::NeuralInference,
        ]
    }

    pub fn descriptor(&self) -> EngineDescriptor {
        match self {
            EngineKind::CloudApi => EngineDescriptor {
                identifier: "cloud-api",
                display_name: "Cloud API",
                requires_network: true,
                default_language: "en-US",
                supported_languages: &[
                    "en-US", "en-GB", "es-ES", "fr-FR", "de-DE", "it-IT", "ja-JP", "zh-CN",
                ],
            },
            EngineKind::LocalDecoder => EngineDescriptor {
                identifier: "local-decoder",
                display_name: "Local Decoder",
                requires_network: false,
                default_language: "en-US",
                supported_languages: &["en-US"],
            },
            EngineKind::NeuralInference => EngineDescriptor {
                identifier: "neural-inference",
                display_name: "Neural Inference",
                requires_network: false,
                default_language: "en",
                supported_languages: &["en"],
            },
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cloud-api" => Ok(EngineKind::CloudApi),
            "local-decoder" => Ok(EngineKind::LocalDecoder),
            "neural-inference" => Ok(EngineKind::NeuralInference),
            _ => Err(Error::Configuration(format!(
                "unknown engine '{s}', available: cloud-api, local-decoder, neural-inference"
            ))),
        }
    }
}

/// Resolve a requested engine identifier and construct the matching engine.
///
/// Two-phase construction: identifier and language are validated first and
/// fail with [`Error::Configuration`] before anything is allocated; only
/// then does the chosen variant perform its own (possibly expensive)
/// initialization. For the neural variant that includes resolving and
/// loading the pretrained model.
pub fn build_engine(settings: &Settings) -> Result<Box<dyn RecognitionEngine>> {
    let kind = settings.engine.parse::<EngineKind>()?;
    let language = resolve_language(kind, settings.language.as_deref())?;

    let engine: Box<dyn RecognitionEngine> = match kind {
        EngineKind::CloudApi => Box::new(CloudApiEngine::new(&settings.cloud, language)?),
        EngineKind::LocalDecoder => Box::new(LocalDecoderEngine::new(&settings.local, language)),
        EngineKind::NeuralInference => Box::new(NeuralEngine::new(&settings.neural, language)?),
    };

    Ok(engine)
}

/// Default the language to the variant's own tag, or hard-validate a
/// caller-supplied tag against the variant's supported set.
pub fn resolve_language(kind: EngineKind, requested: Option<&str>) -> Result<String> {
    let descriptor = kind.descriptor();
    match requested {
        None => Ok(descriptor.default_language.to_string()),
        Some(tag) if descriptor.supported_languages.contains(&tag) => Ok(tag.to_string()),
        Some(tag) => Err(Error::Configuration(format!(
            "language '{tag}' is not supported by {}; supported: {}",
            descriptor.identifier,
            descriptor.supported_languages.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip() {
        for kind in EngineKind::all() {
            assert_eq!(kind.as_str().parse::<EngineKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn unknown_identifier_fails_before_any_resource_is_touched() {
        let mut settings = Settings::default();
        settings.engine = "whisper-xxl".to_string();
        // Point the model cache somewhere that would explode if used.
        settings.neural.models_dir = Some("/nonexistent/forbidden".into());

        let result = build_engine(&settings);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn descriptor_metadata_is_fixed_per_identifier() {
        let cloud = EngineKind::CloudApi.descriptor();
        assert!(cloud.requires_network);
        assert_eq!(cloud.default_language, "en-US");

        let local = EngineKind::LocalDecoder.descriptor();
        assert!(!local.requires_network);
        assert_eq!(local.supported_languages, &["en-US"]);

        let neural = EngineKind::NeuralInference.descriptor();
        assert!(!neural.requires_network);
        assert_eq!(neural.default_language, "en");
    }

    #[test]
    fn unset_language_defaults_to_the_engine_language() {
        let language = resolve_language(EngineKind::NeuralInference, None).unwrap();
        assert_eq!(language, "en");

        let language = resolve_language(EngineKind::CloudApi, None).unwrap();
        assert_eq!(language, "en-US");
    }

    #[test]
    fn unsupported_language_is_rejected() {
        let result = resolve_language(EngineKind::LocalDecoder, Some("fr-FR"));
        assert!(matches!(result, Err(Error::Configuration(_))));

        let ok = resolve_language(EngineKind::CloudApi, Some("de-DE")).unwrap();
        assert_eq!(ok, "de-DE");
    }

    #[test]
    fn language_validation_precedes_expensive_construction() {
        let mut settings = Settings::default();
        settings.engine = "neural-inference".to_string();
        settings.language = Some("xx-XX".to_string());
        settings.neural.models_dir = Some("/nonexistent/forbidden".into());

        // A model fetch would fail with ModelLoad; Configuration proves the
        // language check ran first.
        let result = build_engine(&settings);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
