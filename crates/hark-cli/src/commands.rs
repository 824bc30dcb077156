//! Command implementations over hark-core.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use hark_core::{
    CaptureConfig, RecognitionEngine, Settings, WriteMode, build_engine, capture_continuous,
    capture_from_microphone, format_timestamp, list_capture_devices, load_audio_file,
    save_audio_file, save_transcription,
};

pub fn listen(
    settings: &Settings,
    duration: Option<u32>,
    device: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let mut engine = build_engine(settings).context("failed to build recognition engine")?;

    let config = capture_config(settings, device);
    let buffer = capture_from_microphone(&config, duration.unwrap_or(settings.capture_duration))?;

    let outcome = engine.recognize(&buffer)?;
    report(outcome, output)
}

pub fn continuous(
    settings: &Settings,
    phrase_limit: u32,
    device: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let mut engine = build_engine(settings).context("failed to build recognition engine")?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))
        .context("failed to install interrupt handler")?;

    eprintln!("Listening. Press Ctrl-C to stop.");

    let config = capture_config(settings, device);
    let output = output.map(Path::to_path_buf);
    capture_continuous(&config, phrase_limit, &stop, |buffer| {
        match engine.recognize(&buffer) {
            Ok(outcome) => {
                if let Err(err) = report(outcome, output.as_deref()) {
                    eprintln!("failed to record transcription: {err}");
                }
            }
            Err(err) => eprintln!("recognition failed: {err}"),
        }
    })?;

    Ok(())
}

pub fn file(settings: &Settings, path: &Path, output: Option<&Path>) -> Result<()> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if !is_wav {
        ensure_ffmpeg_installed()?;
    }

    let buffer =
        load_audio_file(path).with_context(|| format!("failed to load {}", path.display()))?;
    eprintln!(
        "Loaded {} ({})",
        path.display(),
        format_timestamp(buffer.duration_secs() as u64)
    );

    let mut engine = build_engine(settings).context("failed to build recognition engine")?;
    let outcome = engine.recognize(&buffer)?;
    report(outcome, output)
}

pub fn devices() -> Result<()> {
    let devices = list_capture_devices();
    if devices.is_empty() {
        eprintln!("No capture devices found.");
        return Ok(());
    }

    for device in devices {
        if device.is_default {
            println!("{} (default)", device.name);
        } else {
            println!("{}", device.name);
        }
    }
    Ok(())
}

pub fn save(
    settings: &Settings,
    path: &Path,
    duration: Option<u32>,
    device: Option<String>,
) -> Result<()> {
    let duration = duration.unwrap_or(settings.capture_duration);
    let config = capture_config(settings, device);
    let buffer = capture_from_microphone(&config, duration)?;

    save_audio_file(&buffer, path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!(
        "Saved {} of audio to {}",
        format_timestamp(u64::from(duration)),
        path.display()
    );
    Ok(())
}

fn capture_config(settings: &Settings, device: Option<String>) -> CaptureConfig {
    CaptureConfig {
        device_name: device.or_else(|| settings.capture_device.clone()),
        sample_rate: settings.sample_rate,
    }
}

/// Print the recognition outcome, keeping "no speech" distinct from failure,
/// and append understood text to the output file when one is configured.
fn report(outcome: Option<String>, output: Option<&Path>) -> Result<()> {
    match outcome {
        Some(text) => {
            println!("{text}");
            if let Some(path) = output {
                save_transcription(&text, path, WriteMode::Append)
                    .context("failed to save transcription")?;
            }
        }
        None => eprintln!("No speech detected."),
    }
    Ok(())
}

fn ensure_ffmpeg_installed() -> Result<()> {
    if std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .is_err()
    {
        bail!(
            "FFmpeg is not installed or not in PATH.\n\
             hark needs FFmpeg to read non-WAV audio files.\n\
             Install it with:\n\
               - Ubuntu/Debian: sudo apt install ffmpeg\n\
               - macOS: brew install ffmpeg\n\
               - Windows: choco install ffmpeg or download from ffmpeg.org"
        );
    }
    Ok(())
}
