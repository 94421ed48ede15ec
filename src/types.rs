use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Ring buffer size in seconds
pub const RING_BUFFER_SECONDS: usize = 5;

/// Largest amplitude a recorder reports (16-bit full scale)
pub const MAX_AMPLITUDE: u32 = i16::MAX as u32;

/// Default tick period while recording or playing
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Horizontal distance between the left edges of two neighbouring bars
pub const BAR_PITCH: f32 = 13.0;

/// Empty space between two neighbouring bars
pub const BAR_GAP: f32 = 5.0;

/// Fraction of the viewport height a full-scale bar may occupy
pub const HEIGHT_RATIO: f32 = 0.8;

/// Atomic float wrapper for real-time audio thread safety
#[derive(Debug)]
pub struct AtomicF32 {
    storage: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            storage: AtomicU32::new(value.to_bits()),
        }
    }

    #[allow(dead_code)]
    pub fn load(&self, ordering: Ordering) -> f32 {
        f32::from_bits(self.storage.load(ordering))
    }

    pub fn store(&self, value: f32, ordering: Ordering) {
        self.storage.store(value.to_bits(), ordering);
    }

    /// Replace the value with 0.0 and return what was stored
    pub fn take(&self, ordering: Ordering) -> f32 {
        f32::from_bits(self.storage.swap(0.0f32.to_bits(), ordering))
    }

    /// Raise the stored value to `value` if it is larger
    pub fn fetch_max(&self, value: f32, ordering: Ordering) {
        let mut current = self.storage.load(ordering);
        while value > f32::from_bits(current) {
            match self.storage.compare_exchange_weak(
                current,
                value.to_bits(),
                ordering,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Recording,
    Playing,
}

impl Mode {
    /// Whether the tick scheduler should be running in this mode
    pub fn is_active(self) -> bool {
        !matches!(self, Mode::Idle)
    }

    /// Record control is unavailable while playing
    pub fn can_record(self) -> bool {
        self != Mode::Playing
    }

    /// Play control is unavailable while recording
    pub fn can_play(self) -> bool {
        self != Mode::Recording
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Recording => "recording",
            Mode::Playing => "playing",
        }
    }
}

/// Format elapsed milliseconds as `MM:SS.cc`
///
/// Centiseconds are truncated, minutes are not wrapped.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let millisecond = elapsed_ms % 1000;
    let second = (elapsed_ms / 1000) % 60;
    let minute = (elapsed_ms / 1000) / 60;

    format!("{:02}:{:02}.{:02}", minute, second, millisecond / 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00.00");
        assert_eq!(format_elapsed(65_432), "01:05.43");
        assert_eq!(format_elapsed(999), "00:00.99");
        assert_eq!(format_elapsed(3_600_000), "60:00.00");
    }

    #[test]
    fn test_atomic_f32_fetch_max_and_take() {
        let value = AtomicF32::new(0.0);
        value.fetch_max(0.4, Ordering::Relaxed);
        value.fetch_max(0.2, Ordering::Relaxed);
        assert_eq!(value.load(Ordering::Relaxed), 0.4);

        assert_eq!(value.take(Ordering::Relaxed), 0.4);
        assert_eq!(value.load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn test_mode_controls() {
        assert!(Mode::Idle.can_record() && Mode::Idle.can_play());
        assert!(!Mode::Playing.can_record());
        assert!(!Mode::Recording.can_play());
        assert!(!Mode::Idle.is_active());
        assert!(Mode::Recording.is_active());
    }
}
