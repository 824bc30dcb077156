//! Persisted transcription artifacts.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use tracing::info;

use crate::error::Result;

/// How [`save_transcription`] treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// Write a transcription entry to `path`.
///
/// Entries are UTF-8 lines of the form `[YYYY-MM-DD HH:MM:SS] text`.
pub fn save_transcription(text: &str, path: &Path, mode: WriteMode) -> Result<()> {
    let mut file = match mode {
        WriteMode::Overwrite => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?,
        WriteMode::Append => OpenOptions::new().append(true).create(true).open(path)?,
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(file, "[{timestamp}] {text}")?;

    info!(path = %path.display(), "transcription saved");
    Ok(())
}

/// Format elapsed seconds as `MM:SS`; minutes run past 59 unbounded.
pub fn format_timestamp(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
