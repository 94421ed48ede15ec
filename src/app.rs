use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::audio::{MicRecorder, WavPlayer};
use crate::config::Config;
use crate::permission::InputDevicePermission;
use crate::session::{Event, Session, SessionConfig, SessionError};
use crate::types::Mode;
use crate::waveform::Viewport;

/// Session wired to the real audio devices
pub type LiveSession = Session<MicRecorder, WavPlayer, InputDevicePermission>;

/// Message type for user notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Warning,
    Error,
}

/// User notification message
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub msg_type: MessageType,
    pub timestamp: Instant,
}

/// Main application state
pub struct App {
    /// Recording/playback session
    pub session: LiveSession,

    /// Size of the waveform surface as of the last layout
    pub viewport: Viewport,

    /// Whether to exit the application
    pub should_quit: bool,

    /// Current message to display (if any)
    pub message: Option<Message>,

    /// Message display duration
    pub message_duration: Duration,

    /// Whether to show help view
    pub show_help: bool,
}

impl App {
    /// Create a new application recording to `output_path`
    pub fn new(config: &Config, output_path: PathBuf) -> Self {
        let input = config.devices.input.clone();
        let output = config.devices.output.clone();

        let session = Session::new(
            SessionConfig {
                output_path,
                tick_interval: config.waveform.tick_interval(),
                layout: config.waveform.layout(),
            },
            MicRecorder::new(input.clone()),
            WavPlayer::new(output),
            InputDevicePermission::new(input),
        );

        Self {
            session,
            viewport: Viewport::default(),
            should_quit: false,
            message: None,
            message_duration: Duration::from_secs(3),
            show_help: false,
        }
    }

    /// Current session mode
    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    /// Record key: start recording, or stop the running recording
    pub fn record(&mut self) {
        self.send(Event::RecordPressed);
    }

    /// Play key
    pub fn play(&mut self) {
        if !self.session.output_path().exists() {
            self.show_warning("Nothing recorded yet");
            return;
        }
        self.send(Event::PlayPressed);
    }

    /// Stop key
    pub fn stop(&mut self) {
        self.send(Event::StopPressed);
    }

    fn send(&mut self, event: Event) {
        if let Err(e) = self.session.dispatch(event) {
            self.report(e);
        }
    }

    fn report(&mut self, error: SessionError) {
        match error {
            SessionError::PermissionDenied { .. } => self.show_warning(error.to_string()),
            SessionError::DeviceUnavailable { .. } | SessionError::TimerUnavailable(_) => {
                self.show_error(error.to_string())
            }
        }
    }

    /// Deliver pending ticks and device notifications
    pub fn update_session(&mut self) {
        if let Err(e) = self.session.poll(self.viewport) {
            self.report(e);
        }
    }

    /// Clear message if it has expired
    pub fn update_message(&mut self) {
        if let Some(ref msg) = self.message {
            if msg.timestamp.elapsed() > self.message_duration {
                self.message = None;
            }
        }
    }

    /// Show a warning message
    pub fn show_warning(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            msg_type: MessageType::Warning,
            timestamp: Instant::now(),
        });
    }

    /// Show an error message
    pub fn show_error(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            msg_type: MessageType::Error,
            timestamp: Instant::now(),
        });
    }

    /// Elapsed time of the current recording or playback
    pub fn elapsed_str(&self) -> &str {
        if !self.mode().is_active() {
            "--:--.--"
        } else {
            self.session.elapsed_label()
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Toggle help view
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Ensure clean shutdown
        self.session.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let output = std::env::temp_dir().join("waverec-app-test-missing.wav");
        App::new(&Config::default(), output)
    }

    #[test]
    fn test_play_without_recording_warns() {
        let mut app = app();
        app.play();
        assert_eq!(app.mode(), Mode::Idle);
        let message = app.message.as_ref().expect("no message shown");
        assert_eq!(message.msg_type, MessageType::Warning);
    }

    #[test]
    fn test_stop_while_idle() {
        let mut app = app();
        app.stop();
        assert_eq!(app.mode(), Mode::Idle);
        assert!(app.message.is_none());
        assert_eq!(app.elapsed_str(), "--:--.--");
    }

    #[test]
    fn test_message_expires() {
        let mut app = app();
        app.message_duration = Duration::from_millis(0);
        app.show_error("boom");
        std::thread::sleep(Duration::from_millis(2));
        app.update_message();
        assert!(app.message.is_none());
    }

    #[test]
    fn test_toggle_help_and_quit() {
        let mut app = app();
        app.toggle_help();
        assert!(app.show_help);
        app.quit();
        assert!(app.should_quit());
    }
}
