//! Audio input device enumeration.

use cpal::traits::{DeviceTrait, HostTrait};

#[cfg(target_os = "linux")]
mod alsa_suppress {
    use std::os::raw::{c_char, c_int};
    use std::sync::Once;

    // ALSA's handler signature is variadic; a non-variadic pointer type is
    // ABI-compatible because the handler ignores every argument.
    type SndLibErrorHandlerT =
        unsafe extern "C" fn(*const c_char, c_int, *const c_char, c_int, *const c_char);

    #[link(name = "asound")]
    unsafe extern "C" {
        fn snd_lib_error_set_handler(handler: Option<SndLibErrorHandlerT>) -> c_int;
    }

    unsafe extern "C" fn silent_error_handler(
        _file: *const c_char,
        _line: c_int,
        _function: *const c_char,
        _err: c_int,
        _fmt: *const c_char,
    ) {
    }

    static INIT: Once = Once::new();

    /// Silence ALSA's stderr chatter about unavailable PCM plugins. Purely
    /// cosmetic; capture works the same without it.
    pub fn init() {
        INIT.call_once(|| {
            // SAFETY: the handler is a valid no-op with a compatible ABI.
            unsafe {
                snd_lib_error_set_handler(Some(silent_error_handler));
            }
        });
    }
}

#[cfg(not(target_os = "linux"))]
mod alsa_suppress {
    pub fn init() {}
}

/// A capture device visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// List available microphone devices.
///
/// Headless hosts get an empty list, not an error; absence of capture
/// hardware only matters once a capture is actually requested.
pub fn list_capture_devices() -> Vec<AudioDeviceInfo> {
    alsa_suppress::init();

    let host = cpal::default_host();
    let default_device_name = host
        .default_input_device()
        .and_then(|d| d.description().ok())
        .map(|d| d.to_string());

    let Ok(devices) = host.input_devices() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for device in devices {
        if let Ok(desc) = device.description() {
            let name = desc.to_string();
            out.push(AudioDeviceInfo {
                is_default: default_device_name.as_ref() == Some(&name),
                name,
            });
        }
    }

    out
}

/// Initialize platform audio quirks before opening a stream.
pub(super) fn init_platform() {
    alsa_suppress::init();
}
