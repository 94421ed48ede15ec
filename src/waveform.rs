use crate::types::{BAR_GAP, BAR_PITCH, HEIGHT_RATIO, MAX_AMPLITUDE};

/// Size of the drawing surface, in the same units as the bar geometry
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// One rendered bar. `top < bottom`, y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Horizontal bar spacing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub pitch: f32,
    pub gap: f32,
}

impl Default for BarLayout {
    fn default() -> Self {
        Self {
            pitch: BAR_PITCH,
            gap: BAR_GAP,
        }
    }
}

impl BarLayout {
    /// Number of bars that fit across the viewport
    pub fn capacity(&self, viewport: Viewport) -> usize {
        if viewport.is_degenerate() || self.pitch <= 0.0 {
            return 0;
        }
        (viewport.width / self.pitch).floor() as usize
    }
}

/// Convert a raw device amplitude to a level in 0.0 - 1.0
pub fn normalize(raw_amplitude: u32) -> f32 {
    raw_amplitude.min(MAX_AMPLITUDE) as f32 / MAX_AMPLITUDE as f32
}

/// Render the last `capacity` levels of `levels` as centered bars, oldest first
pub fn trailing_window(levels: &[f32], layout: BarLayout, viewport: Viewport) -> Vec<Bar> {
    let capacity = layout.capacity(viewport);
    if capacity == 0 {
        return Vec::new();
    }

    let window = &levels[levels.len().saturating_sub(capacity)..];
    let middle = viewport.height / 2.0;

    window
        .iter()
        .enumerate()
        .map(|(index, level)| {
            let thickness = level.clamp(0.0, 1.0) * viewport.height * HEIGHT_RATIO;
            let left = index as f32 * layout.pitch;
            let top = middle - thickness / 2.0;
            Bar {
                left,
                top,
                right: left + (layout.pitch - layout.gap),
                bottom: top + thickness,
            }
        })
        .collect()
}

/// Render the revealed part of `levels` during replay
///
/// Only the first `cursor` levels are visible; a cursor beyond the end shows
/// the whole history.
pub fn replay_window(
    levels: &[f32],
    cursor: usize,
    layout: BarLayout,
    viewport: Viewport,
) -> Vec<Bar> {
    let revealed = &levels[..cursor.min(levels.len())];
    trailing_window(revealed, layout, viewport)
}

/// Amplitude history and bar geometry for one session
///
/// The history stores one normalized level (0.0 - 1.0) per tick. Bar geometry
/// is derived from it on every tick and scaled to whatever viewport the view
/// currently has, so resizing never alters what was recorded.
#[derive(Debug, Default)]
pub struct WaveformEngine {
    layout: BarLayout,
    history: Vec<f32>,
    cursor: usize,
    bars: Vec<Bar>,
}

impl WaveformEngine {
    pub fn new(layout: BarLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    /// Append one sample and return the live (trailing) window
    pub fn record_tick(&mut self, raw_amplitude: u32, viewport: Viewport) -> &[Bar] {
        self.history.push(normalize(raw_amplitude));
        self.bars = trailing_window(&self.history, self.layout, viewport);
        &self.bars
    }

    /// Reveal the history up to the replay cursor, then advance the cursor
    pub fn replay_tick(&mut self, viewport: Viewport) -> &[Bar] {
        self.bars = replay_window(&self.history, self.cursor, self.layout, viewport);
        self.cursor = self.cursor.saturating_add(1);
        &self.bars
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn reset_replay(&mut self) {
        self.bars.clear();
        self.cursor = 0;
    }

    /// Recorded levels, 0.0 - 1.0
    pub fn history(&self) -> &[f32] {
        &self.history
    }

    /// Bars produced by the most recent tick
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Bar {
        fn height(&self) -> f32 {
            self.bottom - self.top
        }

        fn width(&self) -> f32 {
            self.right - self.left
        }
    }

    const SCENARIO: [u32; 5] = [0, 16384, 32767, 8192, 4096];

    fn viewport() -> Viewport {
        Viewport::new(100.0, 200.0)
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(normalize(0), 0.0);
        assert_eq!(normalize(MAX_AMPLITUDE), 1.0);
        assert_eq!(normalize(100_000), 1.0);
    }

    #[test]
    fn test_record_scenario() {
        let mut engine = WaveformEngine::default();
        for raw in SCENARIO {
            engine.record_tick(raw, viewport());
        }

        let bars = engine.bars();
        // floor(100 / 13) = 7 slots but only 5 samples exist
        assert_eq!(bars.len(), 5);

        let expected = [0.0, 80.0, 160.0, 40.0, 20.0];
        for (bar, height) in bars.iter().zip(expected) {
            assert!((bar.height() - height).abs() < 0.1, "{} vs {}", bar.height(), height);
            assert!(((bar.top + bar.bottom) / 2.0 - 100.0).abs() < 0.001);
            assert_eq!(bar.width(), 8.0);
        }

        // oldest first, one pitch apart
        for (index, bar) in bars.iter().enumerate() {
            assert_eq!(bar.left, index as f32 * 13.0);
        }
    }

    #[test]
    fn test_record_window_scrolls() {
        let mut engine = WaveformEngine::default();
        for raw in 1..=20u32 {
            engine.record_tick(raw * 1000, viewport());
        }

        let bars = engine.bars();
        assert_eq!(bars.len(), 7);
        // last seven samples: 14000..=20000
        let first = normalize(14_000) * 200.0 * HEIGHT_RATIO;
        let last = normalize(20_000) * 200.0 * HEIGHT_RATIO;
        assert!((bars[0].height() - first).abs() < 0.01);
        assert!((bars[6].height() - last).abs() < 0.01);
    }

    #[test]
    fn test_history_independent_of_viewport() {
        let mut small = WaveformEngine::default();
        let mut large = WaveformEngine::default();
        for raw in SCENARIO {
            small.record_tick(raw, Viewport::new(10.0, 10.0));
            large.record_tick(raw, Viewport::new(1000.0, 700.0));
        }
        assert_eq!(small.history(), large.history());
        assert_eq!(small.history().len(), SCENARIO.len());
    }

    #[test]
    fn test_degenerate_viewport() {
        let mut engine = WaveformEngine::default();
        assert!(engine.record_tick(1000, Viewport::new(0.0, 200.0)).is_empty());
        assert!(engine.record_tick(1000, Viewport::new(100.0, 0.0)).is_empty());
        assert_eq!(engine.history().len(), 2);
        assert!(engine.replay_tick(Viewport::default()).is_empty());
    }

    #[test]
    fn test_replay_reveals_prefix() {
        let mut engine = WaveformEngine::default();
        for raw in SCENARIO {
            engine.record_tick(raw, viewport());
        }
        engine.reset_replay();
        assert!(engine.bars().is_empty());

        // first tick reveals nothing, each further tick one more bar
        for expected in 0..=SCENARIO.len() {
            assert_eq!(engine.replay_tick(viewport()).len(), expected);
        }
        assert_eq!(engine.cursor, SCENARIO.len() + 1);
    }

    #[test]
    fn test_replay_past_end_keeps_full_window() {
        let mut engine = WaveformEngine::default();
        for raw in SCENARIO {
            engine.record_tick(raw, viewport());
        }
        let recorded = engine.bars().to_vec();

        engine.reset_replay();
        for _ in 0..50 {
            engine.replay_tick(viewport());
        }
        assert_eq!(engine.bars(), recorded.as_slice());
    }

    #[test]
    fn test_replay_window_size_invariant() {
        let mut engine = WaveformEngine::default();
        for raw in 0..30u32 {
            engine.record_tick(raw * 500, viewport());
        }
        engine.reset_replay();
        for tick in 0..40usize {
            let len = engine.replay_tick(viewport()).len();
            assert_eq!(len, 7.min(tick.min(30)));
        }
    }

    #[test]
    fn test_cleared_history_replays_empty() {
        let mut engine = WaveformEngine::default();
        for raw in SCENARIO {
            engine.record_tick(raw, viewport());
        }
        engine.clear_history();
        engine.reset_replay();
        for _ in 0..10 {
            assert!(engine.replay_tick(viewport()).is_empty());
        }
    }

    #[test]
    fn test_custom_layout() {
        let layout = BarLayout { pitch: 2.0, gap: 1.0 };
        let bars = trailing_window(&[1.0, 0.5, 0.25], layout, Viewport::new(4.0, 10.0));
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].left, 0.0);
        assert_eq!(bars[1].left, 2.0);
        assert_eq!(bars[1].width(), 1.0);
        assert!((bars[0].height() - 4.0).abs() < 0.001);
    }
}
