//! Microphone capture: bounded single-shot recording and continuous
//! phrase-at-a-time capture.
//!
//! A cpal callback thread feeds raw samples into a crossbeam channel; the
//! calling thread drains it, applies phrase/duration bounds, and normalizes
//! the result into a canonical [`AudioBuffer`]. Everything here is
//! synchronous; hosts that need capture off their main thread spawn their
//! own worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use super::buffer::{AudioBuffer, CANONICAL_SAMPLE_RATE};
use super::devices;
use crate::error::{Error, Result};

/// Ambient-noise calibration window at stream start.
const CALIBRATION_SECS: f32 = 0.5;

/// Extra seconds allowed on top of the requested duration before a capture
/// is declared stalled, tolerating stream startup latency.
const GRACE_SECS: u64 = 2;

/// Trailing quiet that ends a phrase during continuous capture.
const PAUSE_SECS: f32 = 0.8;

/// Multiplier applied to the ambient RMS to obtain the speech threshold.
const THRESHOLD_FACTOR: f32 = 1.75;

/// How long one listen window waits for speech before handing control back
/// to the loop, so cancellation is observed promptly.
const LISTEN_WINDOW_SECS: u64 = 5;

/// Configuration for microphone capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Device name to use (None = system default).
    pub device_name: Option<String>,

    /// Sample rate requested from the device. The device's default rate is
    /// used when it cannot provide this one; output is canonical either way.
    pub sample_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            sample_rate: CANONICAL_SAMPLE_RATE,
        }
    }
}

impl CaptureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device name.
    pub fn with_device(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }
}

/// Record a bounded clip from the microphone.
///
/// Opens the input stream, runs a fixed 0.5 s ambient calibration pass, then
/// captures `duration_secs` of audio. The stream gets `duration_secs + 2`
/// wall-clock seconds before the capture is declared stalled.
pub fn capture_from_microphone(config: &CaptureConfig, duration_secs: u32) -> Result<AudioBuffer> {
    let stream = open_stream(config)?;

    info!("adjusting for ambient noise");
    let threshold = calibrate(&stream)?;
    debug!(threshold, rate = stream.device_rate, "calibration complete");

    info!("recording for {duration_secs} seconds");
    let needed =
        stream.device_rate as usize * stream.device_channels as usize * duration_secs as usize;
    let deadline = Instant::now() + Duration::from_secs(u64::from(duration_secs) + GRACE_SECS);

    let mut raw: Vec<f32> = Vec::with_capacity(needed);
    while raw.len() < needed {
        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Device(
                "capture timed out before enough audio arrived".into(),
            ));
        }
        match stream.rx.recv_timeout(deadline - now) {
            Ok(chunk) => raw.extend(chunk),
            Err(_) => {
                return Err(Error::Device(
                    "input stream stopped delivering samples".into(),
                ));
            }
        }
    }
    raw.truncate(needed);

    info!("recording complete");
    AudioBuffer::normalize(&raw, stream.device_rate, stream.device_channels)
}

/// Capture phrases until `stop` is set, invoking `on_phrase` for each one.
///
/// Phrases are delimited by the calibrated energy threshold: capture starts
/// when a chunk crosses it and ends after 0.8 s of trailing quiet or at
/// `phrase_time_limit`. Phrases are handed over strictly in capture order,
/// one at a time. A failed phrase is logged and the loop continues; only
/// cancellation or an unrecoverable device failure ends the loop.
pub fn capture_continuous<F>(
    config: &CaptureConfig,
    phrase_time_limit: u32,
    stop: &AtomicBool,
    on_phrase: F,
) -> Result<()>
where
    F: FnMut(AudioBuffer),
{
    let stream = open_stream(config)?;

    info!("adjusting for ambient noise");
    let threshold = calibrate(&stream)?;

    info!("starting continuous capture");
    phrase_loop(
        || next_phrase(&stream, threshold, phrase_time_limit),
        stop,
        on_phrase,
    )
}

/// Drive a phrase source until cancellation or a device failure.
///
/// Factored out of [`capture_continuous`] so the recovery behavior is
/// independent of real capture hardware: `Ok(None)` is a silent window,
/// a device error is fatal, anything else is logged and skipped.
fn phrase_loop<S, F>(mut source: S, stop: &AtomicBool, mut on_phrase: F) -> Result<()>
where
    S: FnMut() -> Result<Option<AudioBuffer>>,
    F: FnMut(AudioBuffer),
{
    while !stop.load(Ordering::Relaxed) {
        match source() {
            Ok(Some(buffer)) => on_phrase(buffer),
            Ok(None) => {}
            Err(err @ Error::Device(_)) => return Err(err),
            Err(err) => warn!("phrase capture failed, continuing: {err}"),
        }
    }

    info!("continuous capture cancelled");
    Ok(())
}

/// Capture one phrase from the stream.
///
/// Returns `Ok(None)` when no speech starts inside the listen window.
fn next_phrase(
    stream: &InputStream,
    threshold: f32,
    phrase_time_limit: u32,
) -> Result<Option<AudioBuffer>> {
    let mut phrase: Vec<f32> = Vec::new();

    // Wait for a chunk that crosses the speech threshold.
    let listen_deadline = Instant::now() + Duration::from_secs(LISTEN_WINDOW_SECS);
    loop {
        let now = Instant::now();
        if now >= listen_deadline {
            return Ok(None);
        }
        match stream.rx.recv_timeout(listen_deadline - now) {
            Ok(chunk) => {
                if rms(&chunk) >= threshold {
                    phrase.extend(chunk);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::Device("input stream closed".into()));
            }
        }
    }

    // Collect until trailing quiet or the phrase limit.
    let started = Instant::now();
    let limit = Duration::from_secs(u64::from(phrase_time_limit));
    let pause_samples =
        (stream.device_rate as f32 * PAUSE_SECS) as usize * stream.device_channels as usize;
    let mut quiet = 0usize;

    while started.elapsed() < limit {
        match stream.rx.recv_timeout(Duration::from_millis(200)) {
            Ok(chunk) => {
                if rms(&chunk) < threshold {
                    quiet += chunk.len();
                } else {
                    quiet = 0;
                }
                phrase.extend(chunk);
                if quiet >= pause_samples {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::Device("input stream closed".into()));
            }
        }
    }

    AudioBuffer::normalize(&phrase, stream.device_rate, stream.device_channels).map(Some)
}

/// An open input stream and the channel its callback feeds.
struct InputStream {
    _stream: cpal::Stream,
    rx: Receiver<Vec<f32>>,
    device_rate: u32,
    device_channels: u16,
}

fn open_stream(config: &CaptureConfig) -> Result<InputStream> {
    devices::init_platform();

    let host = cpal::default_host();
    let device = match &config.device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| Error::Device(format!("failed to enumerate input devices: {e}")))?
            .find(|d| {
                d.description()
                    .map(|desc| desc.to_string() == *name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| Error::Device(format!("input device '{name}' not found")))?,
        None => host
            .default_input_device()
            .ok_or_else(|| Error::Device("no input device available".into()))?,
    };

    let supported = pick_config(&device, config.sample_rate)?;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.config();
    let device_rate = stream_config.sample_rate;
    let device_channels = stream_config.channels;

    let (tx, rx) = crossbeam_channel::unbounded();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, tx)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, tx)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, tx)?,
        other => {
            return Err(Error::Device(format!(
                "unsupported device sample format: {other:?}"
            )));
        }
    };

    stream
        .play()
        .map_err(|e| Error::Device(format!("failed to start input stream: {e}")))?;

    Ok(InputStream {
        _stream: stream,
        rx,
        device_rate,
        device_channels,
    })
}

/// Prefer a device config at the requested rate, falling back to the
/// device's default when the rate is out of range.
fn pick_config(device: &cpal::Device, want_rate: u32) -> Result<cpal::SupportedStreamConfig> {
    if let Ok(ranges) = device.supported_input_configs() {
        for range in ranges {
            if range.min_sample_rate() <= want_rate && want_rate <= range.max_sample_rate() {
                return Ok(range.with_sample_rate(want_rate));
            }
        }
    }

    device
        .default_input_config()
        .map_err(|e| Error::Device(format!("failed to query input config: {e}")))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    // Stream errors are common on Linux (USB audio especially) and non-fatal.
    let err_fn = |err: cpal::StreamError| warn!("input stream error (non-fatal): {err}");

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data
                    .iter()
                    .map(|&s| cpal::Sample::from_sample(s))
                    .collect();
                let _ = tx.send(samples);
            },
            err_fn,
            None,
        )
        .map_err(|e| Error::Device(format!("failed to build input stream: {e}")))
}

/// Collect ~0.5 s of ambient audio and derive the speech energy threshold.
fn calibrate(stream: &InputStream) -> Result<f32> {
    let needed = (stream.device_rate as f32 * CALIBRATION_SECS) as usize
        * stream.device_channels as usize;
    let deadline = Instant::now() + Duration::from_secs(GRACE_SECS);

    let mut ambient: Vec<f32> = Vec::with_capacity(needed);
    while ambient.len() < needed {
        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Device(
                "microphone produced no data during calibration".into(),
            ));
        }
        match stream.rx.recv_timeout(deadline - now) {
            Ok(chunk) => ambient.extend(chunk),
            Err(_) => {
                return Err(Error::Device(
                    "microphone produced no data during calibration".into(),
                ));
            }
        }
    }

    Ok(rms(&ambient) * THRESHOLD_FACTOR)
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}
