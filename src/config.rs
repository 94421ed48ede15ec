use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{BAR_GAP, BAR_PITCH, TICK_INTERVAL};
use crate::waveform::BarLayout;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub devices: DeviceConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub waveform: WaveformConfig,
}

/// Device configuration (index or name substring)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// Recording configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// File recorded to and played back from
    pub file: Option<PathBuf>,
}

/// Waveform timing and geometry
#[derive(Debug, Deserialize, Serialize)]
pub struct WaveformConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_bar_pitch")]
    pub bar_pitch: f32,

    #[serde(default = "default_bar_gap")]
    pub bar_gap: f32,
}

fn default_tick_ms() -> u64 {
    TICK_INTERVAL.as_millis() as u64
}

fn default_bar_pitch() -> f32 {
    BAR_PITCH
}

fn default_bar_gap() -> f32 {
    BAR_GAP
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            bar_pitch: default_bar_pitch(),
            bar_gap: default_bar_gap(),
        }
    }
}

impl WaveformConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn layout(&self) -> BarLayout {
        BarLayout {
            pitch: self.bar_pitch,
            gap: self.bar_gap,
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config in: {}", path.display()))
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let waveform = &self.waveform;

        if waveform.tick_ms < 1 {
            anyhow::bail!("waveform.tick_ms must be >= 1, got {}", waveform.tick_ms);
        }

        if !waveform.bar_pitch.is_finite() || waveform.bar_pitch <= 0.0 {
            anyhow::bail!(
                "waveform.bar_pitch must be positive, got {}",
                waveform.bar_pitch
            );
        }

        if !(0.0..waveform.bar_pitch).contains(&waveform.bar_gap) {
            anyhow::bail!(
                "waveform.bar_gap must be between 0 and bar_pitch ({}), got {}",
                waveform.bar_pitch,
                waveform.bar_gap
            );
        }

        if let Some(ref file) = self.recording.file {
            let is_wav = file
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("wav"))
                .unwrap_or(false);
            if !is_wav {
                anyhow::bail!("recording.file must be a .wav file, got {}", file.display());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert!(config.devices.input.is_none());
        assert!(config.recording.file.is_none());
        assert_eq!(config.waveform.tick_interval(), TICK_INTERVAL);
        assert_eq!(config.waveform.layout(), BarLayout::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
devices:
  input: "USB"
  output: "1"
recording:
  file: "takes/first.wav"
waveform:
  tick_ms: 40
  bar_pitch: 8.0
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.devices.input.as_deref(), Some("USB"));
        assert_eq!(config.devices.output.as_deref(), Some("1"));
        assert_eq!(config.recording.file, Some(PathBuf::from("takes/first.wav")));
        assert_eq!(config.waveform.tick_ms, 40);
        assert_eq!(config.waveform.bar_pitch, 8.0);
        assert_eq!(config.waveform.bar_gap, BAR_GAP);
    }

    #[test]
    fn test_rejects_zero_tick() {
        assert!(Config::from_yaml("waveform:\n  tick_ms: 0\n").is_err());
    }

    #[test]
    fn test_rejects_gap_wider_than_pitch() {
        assert!(Config::from_yaml("waveform:\n  bar_pitch: 4.0\n  bar_gap: 4.0\n").is_err());
        assert!(Config::from_yaml("waveform:\n  bar_gap: -1.0\n").is_err());
    }

    #[test]
    fn test_rejects_non_wav_file() {
        assert!(Config::from_yaml("recording:\n  file: take.3gp\n").is_err());
        assert!(Config::from_yaml("recording:\n  file: take.WAV\n").is_ok());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("/nonexistent/waverec.yaml").is_err());
    }
}
