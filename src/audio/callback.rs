use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rtrb::Producer;

use crate::audio::Completion;
use crate::types::AtomicF32;

/// Capture callback state shared between setup and callback
pub struct CaptureState {
    pub recording: Arc<AtomicBool>,
    pub peak: Arc<AtomicF32>,
    pub producer: Producer<f32>,
}

/// Process one block of captured audio in real time
///
/// Frames are mixed down to mono. The peak of the block is folded into
/// `peak`, and while `recording` is set the mono samples are pushed to the
/// file writer's ring buffer.
///
/// CRITICAL: This function runs in a real-time audio thread:
/// - NO memory allocations
/// - NO mutex locks (use atomics only)
/// - NO I/O operations
pub fn process_capture(
    input_data: &[f32],
    num_channels: usize,
    recording: &AtomicBool,
    peak: &AtomicF32,
    producer: &mut Producer<f32>,
) {
    if num_channels == 0 {
        return;
    }

    let is_recording = recording.load(Ordering::Relaxed);
    let mut block_peak = 0.0f32;

    for frame in input_data.chunks_exact(num_channels) {
        let mono = frame.iter().sum::<f32>() / num_channels as f32;
        block_peak = block_peak.max(mono.abs());

        if is_recording {
            // Dropped samples are preferable to blocking the audio thread
            let _ = producer.push(mono);
        }
    }

    if is_recording {
        peak.fetch_max(block_peak.min(1.0), Ordering::Relaxed);
    }
}

/// Decoded clip ready for playback
#[derive(Debug)]
pub struct Clip {
    /// Interleaved samples
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Clip {
    /// Number of frames in the clip
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Sample for output channel `channel` of frame `frame`
    ///
    /// Mono clips are duplicated to every output channel; extra output
    /// channels beyond the clip's are silent.
    fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.channels as usize;
        let source_channel = if channels == 1 { 0 } else { channel };
        if source_channel >= channels {
            return 0.0;
        }
        self.samples[frame * channels + source_channel]
    }
}

/// Fill one output block from `clip` starting at frame `position`
///
/// Returns the next position. Frames past the end of the clip are silent.
pub fn process_playback(
    output: &mut [f32],
    output_channels: usize,
    clip: &Clip,
    position: usize,
) -> usize {
    if output_channels == 0 {
        return position;
    }

    let total = clip.num_frames();
    let mut frame_index = position;

    for frame in output.chunks_exact_mut(output_channels) {
        if frame_index < total {
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = clip.sample(frame_index, channel);
            }
            frame_index += 1;
        } else {
            frame.fill(0.0);
        }
    }

    frame_index
}

/// Create the capture callback closure
pub fn create_capture_callback(
    mut state: CaptureState,
    num_channels: usize,
) -> impl FnMut(&[f32], &cpal::InputCallbackInfo) + Send + 'static {
    move |data: &[f32], _info: &cpal::InputCallbackInfo| {
        process_capture(
            data,
            num_channels,
            &state.recording,
            &state.peak,
            &mut state.producer,
        );
    }
}

/// Playback callback state
///
/// `on_complete` runs once, from the audio thread, on the first block that
/// reaches the end of the clip. It must stay allocation-free like the rest of
/// the callback; the only deallocation is its box, once per clip.
pub struct PlaybackState {
    clip: Arc<Clip>,
    output_channels: usize,
    position: usize,
    on_complete: Option<Completion>,
}

impl PlaybackState {
    pub fn new(
        clip: Arc<Clip>,
        output_channels: usize,
        on_complete: Completion,
    ) -> Self {
        Self {
            clip,
            output_channels,
            position: 0,
            on_complete: Some(on_complete),
        }
    }

    /// Fill one output block and fire completion at the end of the clip
    pub fn render(&mut self, output: &mut [f32]) {
        self.position = process_playback(output, self.output_channels, &self.clip, self.position);

        if self.position >= self.clip.num_frames() {
            if let Some(notify) = self.on_complete.take() {
                notify();
            }
        }
    }
}

/// Create the playback callback closure
pub fn create_playback_callback(
    mut state: PlaybackState,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
        state.render(data);
    }
}

/// Error callback for audio streams
pub fn create_error_callback(stream: &'static str) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        log::error!("{} stream error: {}", stream, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_not_recording() {
        let recording = AtomicBool::new(false);
        let peak = AtomicF32::new(0.0);
        let (mut producer, _consumer) = rtrb::RingBuffer::new(1024);

        let input_data = vec![0.5f32; 128];
        process_capture(&input_data, 1, &recording, &peak, &mut producer);

        // Should not have written anything to recording buffer
        assert_eq!(producer.slots(), 1024);
        assert_eq!(peak.load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn test_capture_mixes_to_mono() {
        let recording = AtomicBool::new(true);
        let peak = AtomicF32::new(0.0);
        let (mut producer, mut consumer) = rtrb::RingBuffer::new(1024);

        // Stereo input: left 0.2, right 0.6
        let input_data = vec![0.2, 0.6, 0.2, 0.6, 0.2, 0.6];
        process_capture(&input_data, 2, &recording, &peak, &mut producer);

        assert_eq!(consumer.slots(), 3);
        while let Ok(sample) = consumer.pop() {
            assert!((sample - 0.4).abs() < 0.001);
        }
        assert!((peak.load(Ordering::Relaxed) - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_capture_peak_is_absolute() {
        let recording = AtomicBool::new(true);
        let peak = AtomicF32::new(0.0);
        let (mut producer, _consumer) = rtrb::RingBuffer::new(1024);

        process_capture(&[0.1, -0.9, 0.3], 1, &recording, &peak, &mut producer);
        assert!((peak.load(Ordering::Relaxed) - 0.9).abs() < 0.001);
    }

    #[test]
    fn test_playback_mono_to_stereo() {
        let clip = Clip {
            samples: vec![0.1, 0.2, 0.3],
            channels: 1,
            sample_rate: 48000,
        };
        let mut output = vec![1.0f32; 8];

        let next = process_playback(&mut output, 2, &clip, 0);
        assert_eq!(next, 3);
        assert_eq!(output, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.0, 0.0]);
    }

    #[test]
    fn test_playback_resumes_from_position() {
        let clip = Clip {
            samples: vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3],
            channels: 2,
            sample_rate: 48000,
        };
        let mut output = vec![0.0f32; 4];

        let next = process_playback(&mut output, 2, &clip, 1);
        assert_eq!(next, 3);
        assert_eq!(output, vec![0.2, -0.2, 0.3, -0.3]);
    }

    #[test]
    fn test_playback_completes_once() {
        use std::sync::atomic::AtomicUsize;

        let clip = Arc::new(Clip {
            samples: vec![0.5; 4],
            channels: 1,
            sample_rate: 48000,
        });
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        let mut state = PlaybackState::new(
            clip,
            1,
            Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );

        let mut block = vec![0.0f32; 3];
        state.render(&mut block);
        assert_eq!(count.load(Ordering::Relaxed), 0);

        for _ in 0..3 {
            state.render(&mut block);
        }
        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(block, vec![0.0, 0.0, 0.0]);
    }
}
