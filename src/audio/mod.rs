pub mod callback;
pub mod device;
pub mod player;
pub mod recorder;
pub mod writer;

use anyhow::Result;
use std::path::Path;

pub use player::WavPlayer;
pub use recorder::MicRecorder;

/// Microphone capture device, as seen by the session
///
/// [`MicRecorder`] captures through cpal into a WAV file.
pub trait Recorder {
    /// Open the device and target `output`; nothing is captured yet
    fn prepare(&mut self, output: &Path) -> Result<()>;

    /// Begin capturing into the prepared file
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and finalize the file
    fn stop(&mut self) -> Result<()>;

    /// Free the device. Safe to call at any time, including twice.
    fn release(&mut self);

    /// Peak amplitude since the previous call, 0 - 32767
    fn current_amplitude(&mut self) -> u32;
}

/// Called once when playback reaches the end of the file
pub type Completion = Box<dyn FnOnce() + Send>;

/// Playback device, as seen by the session
///
/// [`WavPlayer`] plays a WAV file back through cpal.
pub trait Player {
    /// Open the device and load `input`
    fn prepare(&mut self, input: &Path) -> Result<()>;

    /// Begin playback. `on_complete` runs at most once, possibly on the
    /// real-time audio thread, so it must not block or allocate.
    fn start(&mut self, on_complete: Completion) -> Result<()>;

    /// Stop playback and free the device. Safe to call at any time.
    fn release(&mut self);
}
