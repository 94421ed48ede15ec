use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::audio::{Player, Recorder};
use crate::permission::PermissionGate;
use crate::scheduler::{Tick, TickScheduler};
use crate::types::{format_elapsed, Mode};
use crate::waveform::{Bar, BarLayout, Viewport, WaveformEngine};

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    RecordPressed,
    StopPressed,
    PlayPressed,
    PlaybackCompleted,
    /// The permission gate answered a request
    PermissionResult(bool),
}

/// Which device failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Recorder,
    Player,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Recorder => f.write_str("recorder"),
            DeviceKind::Player => f.write_str("player"),
        }
    }
}

/// Why an intent did not take effect
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{device} unavailable: {reason}")]
    DeviceUnavailable { device: DeviceKind, reason: String },

    #[error("{}", permission_message(.rationale))]
    PermissionDenied { rationale: bool },

    #[error("tick timer unavailable: {0}")]
    TimerUnavailable(String),
}

fn permission_message(rationale: &bool) -> &'static str {
    if *rationale {
        "recording needs a microphone; connect an input device and press r again"
    } else {
        "microphone not available"
    }
}

/// Fixed per-session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub output_path: PathBuf,
    pub tick_interval: Duration,
    pub layout: BarLayout,
}

/// Asynchronous notifications marshaled onto the session's thread
#[derive(Debug)]
enum Notice {
    Permission(bool),
}

/// The one recording/playback session of the application
///
/// Every user intent and device notification becomes an [`Event`] and goes
/// through [`Session::dispatch`], which looks up `(mode, event)` and either
/// performs the transition or ignores the event. Only one of the recorder and
/// the player is ever open.
///
/// Replay advances one bar per tick rather than following the player's
/// actual position, so the waveform reveal approximates playback timing and
/// can drift from it on long recordings.
pub struct Session<R: Recorder, P: Player, G: PermissionGate> {
    mode: Mode,
    output_path: PathBuf,
    /// When the running recording or playback was entered
    started_at: Option<Instant>,

    recorder: R,
    player: P,
    permission: G,
    recorder_open: bool,
    player_open: bool,

    scheduler: TickScheduler,
    waveform: WaveformEngine,
    elapsed_label: String,

    /// Identifies the current playback so late completions are recognised
    playback: u64,
    /// Id of the last playback whose player reported the end; 0 for none.
    /// Written from the audio thread, so no channel send there.
    completed: Arc<AtomicU64>,
    notice_tx: Sender<Notice>,
    notice_rx: Receiver<Notice>,
}

impl<R: Recorder, P: Player, G: PermissionGate> Session<R, P, G> {
    pub fn new(config: SessionConfig, recorder: R, player: P, permission: G) -> Self {
        let (notice_tx, notice_rx) = mpsc::channel();

        Self {
            mode: Mode::Idle,
            output_path: config.output_path,
            started_at: None,
            recorder,
            player,
            permission,
            recorder_open: false,
            player_open: false,
            scheduler: TickScheduler::new(config.tick_interval),
            waveform: WaveformEngine::new(config.layout),
            elapsed_label: format_elapsed(0),
            playback: 0,
            completed: Arc::new(AtomicU64::new(0)),
            notice_tx,
            notice_rx,
        }
    }

    /// Apply one event; returns the mode afterwards
    ///
    /// Events with no transition from the current mode are ignored. Device
    /// failures are logged, leave the session `Idle`, and come back as the
    /// error so the view can mention them.
    pub fn dispatch(&mut self, event: Event) -> Result<Mode, SessionError> {
        match (self.mode, event) {
            (Mode::Idle, Event::RecordPressed) => {
                if self.permission.is_granted() {
                    self.start_recording()?;
                } else {
                    self.request_permission();
                }
            }
            (Mode::Idle, Event::PermissionResult(true)) => self.start_recording()?,
            (_, Event::PermissionResult(false)) => {
                let rationale = self.permission.should_show_rationale();
                warn!("Record permission refused (rationale: {})", rationale);
                return Err(SessionError::PermissionDenied { rationale });
            }
            (Mode::Recording, Event::RecordPressed) => self.stop_recording(),
            (Mode::Idle, Event::PlayPressed) => self.start_playing()?,
            (Mode::Playing, Event::StopPressed) | (Mode::Playing, Event::PlaybackCompleted) => {
                self.stop_playing()
            }
            (mode, event) => debug!("Ignoring {:?} while {}", event, mode.as_str()),
        }

        Ok(self.mode)
    }

    /// Run pending notifications and ticks
    ///
    /// Call once per main-loop iteration. `viewport` is the current size of
    /// the waveform surface. Returns the first failure among the handled
    /// notifications; all of them are handled regardless.
    pub fn poll(&mut self, viewport: Viewport) -> Result<(), SessionError> {
        let mut result = Ok(());

        while let Ok(notice) = self.notice_rx.try_recv() {
            let event = match notice {
                Notice::Permission(granted) => Event::PermissionResult(granted),
            };

            if let Err(e) = self.dispatch(event) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        match self.completed.swap(0, Ordering::AcqRel) {
            0 => {}
            playback if playback == self.playback => {
                if let Err(e) = self.dispatch(Event::PlaybackCompleted) {
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
            playback => debug!("Dropping completion of earlier playback {}", playback),
        }

        while let Some(tick) = self.scheduler.try_next() {
            self.handle_tick(tick, viewport);
        }

        result
    }

    /// Advance the waveform for one tick of the running schedule
    ///
    /// Ticks from a stopped schedule are ignored.
    pub fn handle_tick(&mut self, tick: Tick, viewport: Viewport) {
        if !self.scheduler.accepts(&tick) {
            return;
        }

        match self.mode {
            Mode::Recording => {
                let amplitude = self.recorder.current_amplitude();
                self.waveform.record_tick(amplitude, viewport);
            }
            Mode::Playing => {
                self.waveform.replay_tick(viewport);
            }
            Mode::Idle => return,
        }

        self.elapsed_label = format_elapsed(tick.elapsed_ms());
    }

    /// Stop whatever is running
    pub fn shutdown(&mut self) {
        match self.mode {
            Mode::Recording => self.stop_recording(),
            Mode::Playing => self.stop_playing(),
            Mode::Idle => {}
        }
    }

    fn request_permission(&mut self) {
        info!("Requesting record permission");
        let granted = self.permission.request();
        // Delivered like any other asynchronous answer
        let _ = self.notice_tx.send(Notice::Permission(granted));
    }

    fn start_recording(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self.open_recorder() {
            error!("Failed to start recording: {:#}", e);
            self.recorder.release();
            return Err(SessionError::DeviceUnavailable {
                device: DeviceKind::Recorder,
                reason: format!("{:#}", e),
            });
        }

        if let Err(e) = self.scheduler.start() {
            error!("Failed to start tick timer: {:#}", e);
            self.recorder.release();
            return Err(SessionError::TimerUnavailable(format!("{:#}", e)));
        }
        self.recorder_open = true;

        self.waveform.clear_history();
        self.waveform.reset_replay();
        self.enter(Mode::Recording);

        info!("Recording to {}", self.output_path.display());
        Ok(())
    }

    fn open_recorder(&mut self) -> anyhow::Result<()> {
        self.recorder.prepare(&self.output_path)?;
        self.recorder.start()
    }

    fn stop_recording(&mut self) {
        self.scheduler.stop();

        if self.recorder_open {
            if let Err(e) = self.recorder.stop() {
                error!("Failed to stop recording cleanly: {:#}", e);
            }
            self.recorder.release();
            self.recorder_open = false;
        }

        if let Some(started_at) = self.started_at {
            info!(
                "Recording stopped after {:.2}s ({} samples)",
                started_at.elapsed().as_secs_f64(),
                self.waveform.history().len()
            );
        }
        self.leave();
    }

    fn start_playing(&mut self) -> Result<(), SessionError> {
        self.playback += 1;
        let playback = self.playback;
        let completed = self.completed.clone();
        let on_complete = Box::new(move || {
            completed.store(playback, Ordering::Release);
        });

        let opened = self
            .player
            .prepare(&self.output_path)
            .and_then(|()| self.player.start(on_complete));

        if let Err(e) = opened {
            error!("Failed to start playback: {:#}", e);
            self.player.release();
            return Err(SessionError::DeviceUnavailable {
                device: DeviceKind::Player,
                reason: format!("{:#}", e),
            });
        }

        if let Err(e) = self.scheduler.start() {
            error!("Failed to start tick timer: {:#}", e);
            self.player.release();
            return Err(SessionError::TimerUnavailable(format!("{:#}", e)));
        }
        self.player_open = true;

        self.waveform.reset_replay();
        self.enter(Mode::Playing);

        info!("Playing {}", self.output_path.display());
        Ok(())
    }

    fn stop_playing(&mut self) {
        self.scheduler.stop();

        if self.player_open {
            self.player.release();
            self.player_open = false;
        }

        self.waveform.reset_replay();
        info!("Playback stopped at {}", self.elapsed_label);
        self.leave();
    }

    /// Switch to an active mode; the scheduler is already running
    fn enter(&mut self, mode: Mode) {
        self.mode = mode;
        self.started_at = Some(Instant::now());
        self.elapsed_label = format_elapsed(0);
        debug!(
            "Entered {} (tick schedule {})",
            mode.as_str(),
            self.scheduler.generation()
        );
    }

    fn leave(&mut self) {
        self.mode = Mode::Idle;
        self.started_at = None;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// `MM:SS.cc` of the most recent tick
    pub fn elapsed_label(&self) -> &str {
        &self.elapsed_label
    }

    /// Bars to draw for the most recent tick
    pub fn bars(&self) -> &[Bar] {
        self.waveform.bars()
    }
}

impl<R: Recorder, P: Player, G: PermissionGate> Drop for Session<R, P, G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
