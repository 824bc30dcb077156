//! Audio acquisition: canonical buffers, microphone capture, file I/O, and
//! device enumeration.

mod buffer;
pub mod capture;
pub mod devices;
pub mod loader;

pub use buffer::{AudioBuffer, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};
pub use devices::{AudioDeviceInfo, list_capture_devices};
