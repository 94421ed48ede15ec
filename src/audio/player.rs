use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::path::Path;
use std::sync::Arc;

use crate::audio::callback::{create_error_callback, create_playback_callback, Clip, PlaybackState};
use crate::audio::device::{get_output_config_for_rate, resolve_device, Direction};
use crate::audio::writer::load_clip;
use crate::audio::{Completion, Player};

/// WAV file player on a cpal output stream
pub struct WavPlayer {
    /// Device selector from config (index or name); `None` uses the default
    selector: Option<String>,

    /// Output device and config chosen for the loaded clip
    output: Option<(Device, StreamConfig)>,

    /// Loaded audio
    clip: Option<Arc<Clip>>,

    /// Active output stream
    stream: Option<Stream>,
}

impl WavPlayer {
    pub fn new(selector: Option<String>) -> Self {
        Self {
            selector,
            output: None,
            clip: None,
            stream: None,
        }
    }
}

impl Player for WavPlayer {
    fn prepare(&mut self, input: &Path) -> Result<()> {
        self.release();

        let clip = load_clip(input)?;

        let device = resolve_device(Direction::Output, self.selector.as_deref())?;
        let supported_config = get_output_config_for_rate(&device, clip.sample_rate)
            .with_context(|| format!("Cannot play {}", input.display()))?;

        let config = StreamConfig {
            channels: supported_config.channels(),
            sample_rate: supported_config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        log::debug!(
            "Prepared output: {} frames, {}ch @ {}Hz",
            clip.num_frames(),
            config.channels,
            config.sample_rate
        );

        self.clip = Some(Arc::new(clip));
        self.output = Some((device, config));

        Ok(())
    }

    fn start(&mut self, on_complete: Completion) -> Result<()> {
        let (Some((device, config)), Some(clip)) = (&self.output, &self.clip) else {
            anyhow::bail!("Player not prepared");
        };

        let state = PlaybackState::new(clip.clone(), config.channels as usize, on_complete);

        let stream = device
            .build_output_stream(
                config,
                create_playback_callback(state),
                create_error_callback("Output"),
                None,
            )
            .context("Failed to build audio output stream")?;

        stream.play().context("Failed to start output stream")?;
        self.stream = Some(stream);

        Ok(())
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause output stream: {}", e);
            }
        }
        self.output = None;
        self.clip = None;
    }
}

impl Drop for WavPlayer {
    fn drop(&mut self) {
        self.release();
    }
}
