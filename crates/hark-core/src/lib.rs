//! hark-core: audio acquisition and pluggable speech recognition.
//!
//! Audio from a microphone or a file is normalized into a canonical mono
//! 16 kHz PCM [`AudioBuffer`] and dispatched to one of three interchangeable
//! recognition backends (cloud API, local decoder, neural inference) behind
//! the [`RecognitionEngine`] contract. Engines report a transcript, the
//! first-class "no speech understood" outcome, or an operational fault, and
//! callers can always tell the three apart.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod resample;
pub mod transcript;

pub use audio::capture::{CaptureConfig, capture_continuous, capture_from_microphone};
pub use audio::loader::{SUPPORTED_FORMATS, load_audio_file, save_audio_file};
pub use audio::{
    AudioBuffer, AudioDeviceInfo, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE, list_capture_devices,
};
pub use config::{CloudSettings, DeviceBinding, LocalSettings, NeuralSettings, Settings};
pub use engine::{
    DECODER_UNAVAILABLE, EngineDescriptor, EngineKind, RecognitionEngine, build_engine,
};
pub use error::{Error, Result};
pub use transcript::{WriteMode, format_timestamp, save_transcription};
