//! Output device enumeration.
//!
//! The participant picks an output by index before the session starts; the
//! indices here are what the selection prompt shows.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::{AudioError, AudioResult};

/// Information about one enumerable audio output.
#[derive(Debug, Clone)]
pub struct OutputDevice {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
}

/// Lists the default host's output devices in enumeration order.
pub fn list_output_devices() -> AudioResult<Vec<OutputDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    let devices = host
        .output_devices()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;

    let mut out = Vec::new();
    for (index, device) in devices.enumerate() {
        let name = match device.name() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let is_default = default_name.as_deref() == Some(name.as_str());
        out.push(OutputDevice {
            index,
            name,
            is_default,
        });
    }

    if out.is_empty() {
        return Err(AudioError::NoDevices);
    }
    Ok(out)
}

/// Resolves a selection index to a cpal device; `None` means the system
/// default output.
pub(crate) fn resolve_device(selection: Option<usize>) -> AudioResult<cpal::Device> {
    let host = cpal::default_host();
    match selection {
        None => host.default_output_device().ok_or(AudioError::NoDevices),
        Some(index) => {
            let devices = host
                .output_devices()
                .map_err(|e| AudioError::ConfigError(e.to_string()))?;
            devices
                .into_iter()
                .nth(index)
                .ok_or_else(|| AudioError::DeviceNotFound(format!("index {index}")))
        }
    }
}
