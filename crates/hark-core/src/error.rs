//! Error taxonomy for the hark core.
//!
//! Operational faults are `Error` values; "audio understood as containing no
//! speech" is not a fault and is reported as `Ok(None)` by the engines.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid engine identifier, language tag, or missing credentials.
    /// Raised before any network client, subprocess, or model resource is
    /// allocated.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Capture hardware unavailable, access denied, or the input stream
    /// stopped delivering samples.
    #[error("capture device error: {0}")]
    Device(String),

    /// File extension outside the supported allow-list.
    #[error("unsupported audio format '.{0}'")]
    UnsupportedFormat(String),

    /// Corrupt or unreadable audio input, or a converter failure.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Cloud recognition backend fault (transport or service).
    #[error("recognition service error: {0}")]
    Service(String),

    /// The pretrained model could not be fetched or loaded.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// Device or runtime fault during the forward pass.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => Error::Io(io),
            other => Error::Decode(other.to_string()),
        }
    }
}
