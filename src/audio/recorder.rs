use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::audio::callback::{create_capture_callback, create_error_callback, CaptureState};
use crate::audio::device::{get_default_input_config, resolve_device, Direction};
use crate::audio::writer::FileWriter;
use crate::audio::Recorder;
use crate::types::{AtomicF32, MAX_AMPLITUDE, RING_BUFFER_SECONDS};

/// Microphone recorder: cpal input stream feeding a WAV file writer
///
/// The device is looked up on every `prepare`, so a microphone plugged in
/// after startup is picked up on the next recording.
pub struct MicRecorder {
    /// Device selector from config (index or name); `None` uses the default
    selector: Option<String>,

    /// Active input stream
    stream: Option<Stream>,

    /// File writer for the prepared output
    file_writer: Option<FileWriter>,

    /// Recording state flag shared with the audio callback
    recording: Arc<AtomicBool>,

    /// Peak level (0.0 - 1.0) since the last amplitude read
    peak: Arc<AtomicF32>,
}

impl MicRecorder {
    pub fn new(selector: Option<String>) -> Self {
        Self {
            selector,
            stream: None,
            file_writer: None,
            recording: Arc::new(AtomicBool::new(false)),
            peak: Arc::new(AtomicF32::new(0.0)),
        }
    }
}

impl Recorder for MicRecorder {
    fn prepare(&mut self, output: &Path) -> Result<()> {
        self.release();

        let device = resolve_device(Direction::Input, self.selector.as_deref())?;
        let supported_config = get_default_input_config(&device)?;

        let config = StreamConfig {
            channels: supported_config.channels(),
            sample_rate: supported_config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        let num_channels = config.channels as usize;

        // Mono samples, so the buffer only needs one channel's worth
        let buffer_samples = config.sample_rate as usize * RING_BUFFER_SECONDS;
        let (producer, consumer) = rtrb::RingBuffer::new(buffer_samples);

        let callback_state = CaptureState {
            recording: self.recording.clone(),
            peak: self.peak.clone(),
            producer,
        };

        let stream = device
            .build_input_stream(
                &config,
                create_capture_callback(callback_state, num_channels),
                create_error_callback("Input"),
                None,
            )
            .context("Failed to build audio input stream")?;

        log::debug!(
            "Prepared input: {}ch @ {}Hz -> {}",
            num_channels,
            config.sample_rate,
            output.display()
        );

        self.file_writer = Some(FileWriter::new(
            consumer,
            output.to_path_buf(),
            config.sample_rate,
        ));
        self.stream = Some(stream);

        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let (Some(stream), Some(file_writer)) = (&self.stream, &mut self.file_writer) else {
            anyhow::bail!("Recorder not prepared");
        };

        file_writer.start()?;

        self.peak.store(0.0, Ordering::Relaxed);
        self.recording.store(true, Ordering::Relaxed);

        if let Err(e) = stream.play() {
            self.recording.store(false, Ordering::Relaxed);
            abandon_writer(file_writer);
            return Err(e).context("Failed to start input stream");
        }

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.recording.swap(false, Ordering::Relaxed) {
            return Ok(()); // Not recording
        }

        if let Some(stream) = &self.stream {
            stream.pause().context("Failed to pause input stream")?;
        }

        // Drains the ring buffer and finalizes the file
        if let Some(file_writer) = &mut self.file_writer {
            file_writer.stop()?;
        }

        Ok(())
    }

    fn release(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Recorder stop during release failed: {:#}", e);
        }
        self.stream = None;
        self.file_writer = None;
    }

    fn current_amplitude(&mut self) -> u32 {
        let peak = self.peak.take(Ordering::Relaxed).clamp(0.0, 1.0);
        (peak * MAX_AMPLITUDE as f32) as u32
    }
}

/// Finalize a writer whose capture never started; failures are only logged
fn abandon_writer(file_writer: &mut FileWriter) {
    if let Err(e) = file_writer.stop() {
        log::warn!("Recorder writer stop after failed start: {:#}", e);
    }
}

impl Drop for MicRecorder {
    fn drop(&mut self) {
        // Ensure the file is finalized
        self.release();
    }
}
