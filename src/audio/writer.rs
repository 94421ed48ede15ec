use anyhow::{Context, Result};
use chrono::Local;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rtrb::Consumer;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::callback::Clip;

/// File writer that drains the capture ring buffer into a mono WAV file
pub struct FileWriter {
    consumer: Option<Consumer<f32>>,
    path: PathBuf,
    sample_rate: u32,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<Result<Consumer<f32>>>>,
}

impl FileWriter {
    /// Create a new file writer
    pub fn new(consumer: Consumer<f32>, path: PathBuf, sample_rate: u32) -> Self {
        Self {
            consumer: Some(consumer),
            path,
            sample_rate,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start the file writer thread
    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::Relaxed) {
            anyhow::bail!("File writer already running");
        }

        if self.consumer.is_none() {
            anyhow::bail!("FileWriter already started");
        }

        // Create the file up front so path errors surface before capture starts
        let writer = create_wav_writer(&self.path, self.sample_rate)?;

        let consumer = self
            .consumer
            .take()
            .ok_or_else(|| anyhow::anyhow!("FileWriter already started"))?;

        self.running.store(true, Ordering::Relaxed);

        let running = self.running.clone();
        let path = self.path.clone();

        let handle = thread::Builder::new()
            .name("wav-writer".to_string())
            .spawn(move || run_file_writer(consumer, writer, &path, &running))
            .context("Failed to spawn file writer thread")?;

        self.thread_handle = Some(handle);

        Ok(())
    }

    /// Stop the file writer thread and wait for it to finalize the file
    pub fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.thread_handle.take() {
            let consumer = handle
                .join()
                .map_err(|_| anyhow::anyhow!("File writer thread panicked"))??;

            // Restore the consumer so we can start recording again
            self.consumer = Some(consumer);
        }

        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Failed to finalize {}: {:#}", self.path.display(), e);
        }
    }
}

/// WAV specification: 32-bit float mono
fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

fn create_wav_writer(path: &Path, sample_rate: u32) -> Result<WavWriter<BufWriter<File>>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    WavWriter::create(path, wav_spec(sample_rate))
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))
}

/// File writer main loop
fn run_file_writer(
    mut consumer: Consumer<f32>,
    mut writer: WavWriter<BufWriter<File>>,
    path: &Path,
    running: &AtomicBool,
) -> Result<Consumer<f32>> {
    let mut last_flush = Instant::now();
    let flush_interval = Duration::from_secs(2);

    while running.load(Ordering::Relaxed) {
        let mut samples_written = 0;

        while let Ok(sample) = consumer.pop() {
            writer
                .write_sample(sample)
                .with_context(|| format!("Failed to write sample to {}", path.display()))?;
            samples_written += 1;
        }

        // Periodically flush to disk for crash safety
        if last_flush.elapsed() > flush_interval {
            writer.flush().context("Failed to flush WAV file")?;
            last_flush = Instant::now();
        }

        // Sleep briefly if no samples were available
        if samples_written == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    // Drain any remaining samples
    while let Ok(sample) = consumer.pop() {
        let _ = writer.write_sample(sample);
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    log::info!("Finalized {}", path.display());

    // Return the consumer so it can be reused
    Ok(consumer)
}

/// Load a WAV file into memory as interleaved f32 samples
pub fn load_clip(path: &Path) -> Result<Clip> {
    let reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        anyhow::bail!("WAV file '{}' has no channels", path.display());
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read WAV samples")?,
        SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read WAV samples")?,
            bits @ (24 | 32) => {
                let max_value = ((1i64 << (bits - 1)) - 1) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_value))
                    .collect::<Result<Vec<_>, _>>()
                    .context("Failed to read WAV samples")?
            }
            bits => anyhow::bail!(
                "Unsupported bit depth: file '{}' has {} bits per sample",
                path.display(),
                bits
            ),
        },
    };

    Ok(Clip {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Generate a timestamp for file naming
pub fn generate_timestamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Default recording file name for a session started now
pub fn default_recording_name() -> String {
    format!("recording-{}.wav", generate_timestamp())
}
