//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hark", version, about = "Speech capture and transcription")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Recognition engine: cloud-api, local-decoder, neural-inference
    #[arg(long, global = true, default_value = "cloud-api")]
    pub engine: String,

    /// Language tag (defaults to the engine's own language)
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Append transcriptions to this file
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record one clip from the microphone and transcribe it
    Listen {
        /// Recording duration in seconds (default: 5)
        #[arg(long)]
        duration: Option<u32>,

        /// Capture device name (default: system default)
        #[arg(long)]
        device: Option<String>,
    },

    /// Transcribe phrases continuously until interrupted
    Continuous {
        /// Maximum seconds per phrase
        #[arg(long, default_value_t = 5)]
        phrase_limit: u32,

        /// Capture device name (default: system default)
        #[arg(long)]
        device: Option<String>,
    },

    /// Transcribe an audio file
    File {
        /// Path to a supported audio file
        path: PathBuf,
    },

    /// List available capture devices
    Devices,

    /// Record a clip and save it as WAV without transcribing
    Save {
        /// Output WAV path
        path: PathBuf,

        /// Recording duration in seconds (default: 5)
        #[arg(long)]
        duration: Option<u32>,

        /// Capture device name (default: system default)
        #[arg(long)]
        device: Option<String>,
    },
}
