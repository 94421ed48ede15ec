use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SupportedStreamConfig};

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub channels: usize,
    pub sample_rate: u32,
}

/// Which side of the host a device is looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Get the default audio host
pub fn get_host() -> Host {
    cpal::default_host()
}

fn device_name(device: &Device) -> Option<String> {
    device.description().ok().map(|desc| desc.name().to_string())
}

fn devices(host: &Host, direction: Direction) -> Result<Vec<Device>> {
    let devices = match direction {
        Direction::Input => host.input_devices()?.collect(),
        Direction::Output => host.output_devices()?.collect(),
    };
    Ok(devices)
}

fn default_device(host: &Host, direction: Direction) -> Option<Device> {
    match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    }
}

/// List all available devices in one direction
pub fn list_devices(direction: Direction) -> Result<Vec<AudioDeviceInfo>> {
    let host = get_host();
    let default_name = default_device(&host, direction)
        .as_ref()
        .and_then(device_name);

    let mut infos = Vec::new();

    for device in devices(&host, direction)? {
        let Some(name) = device_name(&device) else {
            continue;
        };
        let is_default = Some(&name) == default_name.as_ref();

        let config = match direction {
            Direction::Input => device.default_input_config().ok(),
            Direction::Output => device.default_output_config().ok(),
        };
        let (channels, sample_rate) = if let Some(cfg) = config {
            (cfg.channels() as usize, cfg.sample_rate())
        } else {
            (0, 0)
        };

        infos.push(AudioDeviceInfo {
            name,
            is_default,
            channels,
            sample_rate,
        });
    }

    Ok(infos)
}

/// Resolve a device from an optional selector (index or name substring)
///
/// `None` picks the host default.
pub fn resolve_device(direction: Direction, selector: Option<&str>) -> Result<Device> {
    let host = get_host();

    let Some(selector) = selector else {
        return default_device(&host, direction).with_context(|| match direction {
            Direction::Input => "No default input device available",
            Direction::Output => "No default output device available",
        });
    };

    let devices = devices(&host, direction)?;

    // Try to parse as index first
    if let Ok(index) = selector.parse::<usize>() {
        if index >= devices.len() {
            anyhow::bail!(
                "Device index {} out of range (found {} devices)",
                index,
                devices.len()
            );
        }
        return Ok(devices[index].clone());
    }

    // Otherwise, search by name (case-insensitive substring match)
    let selector_lower = selector.to_lowercase();
    devices
        .into_iter()
        .find(|device| {
            device_name(device)
                .map(|name| name.to_lowercase().contains(&selector_lower))
                .unwrap_or(false)
        })
        .with_context(|| format!("Audio device '{}' not found", selector))
}

/// Get the default input configuration for a device
pub fn get_default_input_config(device: &Device) -> Result<SupportedStreamConfig> {
    device
        .default_input_config()
        .context("Failed to get default input config")
}

/// Find an output configuration that runs at `sample_rate`
///
/// Prefers stereo, then any channel count. Falls back to the default output
/// config when it already matches the rate.
pub fn get_output_config_for_rate(device: &Device, sample_rate: u32) -> Result<SupportedStreamConfig> {
    let default = device
        .default_output_config()
        .context("Failed to get default output config")?;
    if default.sample_rate() == sample_rate {
        return Ok(default);
    }

    let mut best: Option<SupportedStreamConfig> = None;
    for config_range in device
        .supported_output_configs()
        .context("Failed to query output configs")?
    {
        if config_range.min_sample_rate() > sample_rate
            || sample_rate > config_range.max_sample_rate()
        {
            continue;
        }

        let is_better = match &best {
            None => true,
            Some(current) => current.channels() != 2 && config_range.channels() == 2,
        };
        if is_better {
            best = Some(config_range.with_sample_rate(sample_rate));
        }
    }

    best.with_context(|| format!("Output device does not support {}Hz", sample_rate))
}
