use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// One timer firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Schedule this tick belongs to
    pub generation: u64,
    /// Time since the schedule was started
    pub elapsed: Duration,
}

impl Tick {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Fixed-period ticker feeding the main loop
///
/// A timer thread sends ticks over a channel; the owner pulls them with
/// [`TickScheduler::try_next`]. Every `start` opens a new generation and every
/// `stop` closes it, so ticks still queued from an earlier schedule are
/// dropped instead of delivered.
pub struct TickScheduler {
    interval: Duration,
    generation: u64,
    active: bool,
    cancel: Option<Arc<AtomicBool>>,
    thread_handle: Option<thread::JoinHandle<()>>,
    sender: Sender<Tick>,
    receiver: Receiver<Tick>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            interval,
            generation: 0,
            active: false,
            cancel: None,
            thread_handle: None,
            sender,
            receiver,
        }
    }

    /// Start firing; restarts from zero elapsed if already running
    ///
    /// On error the scheduler is left stopped.
    pub fn start(&mut self) -> Result<()> {
        self.stop();

        if self.interval.is_zero() {
            anyhow::bail!("Tick interval must be non-zero");
        }

        self.generation += 1;

        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = cancel.clone();

        let generation = self.generation;
        let interval = self.interval;
        let sender = self.sender.clone();

        let handle = thread::Builder::new()
            .name(format!("tick-{}", generation))
            .spawn(move || run_ticker(generation, interval, &thread_cancel, &sender))
            .context("Failed to spawn tick thread")?;

        self.cancel = Some(cancel);
        self.thread_handle = Some(handle);
        self.active = true;

        Ok(())
    }

    /// Stop firing. Calling this while stopped does nothing.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }

        // Wake the timer so it notices cancellation now; it exits on its own
        if let Some(handle) = self.thread_handle.take() {
            handle.thread().unpark();
        }

        self.active = false;

        // Discard anything already queued
        while self.receiver.try_recv().is_ok() {}
    }

    /// Next pending tick of the current schedule, if any
    pub fn try_next(&mut self) -> Option<Tick> {
        loop {
            match self.receiver.try_recv() {
                Ok(tick) if self.accepts(&tick) => return Some(tick),
                Ok(_) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Whether `tick` belongs to the running schedule
    pub fn accepts(&self, tick: &Tick) -> bool {
        self.active && tick.generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Timer thread main loop
fn run_ticker(generation: u64, interval: Duration, cancel: &AtomicBool, sender: &Sender<Tick>) {
    let started = Instant::now();
    let mut deadline = started + interval;

    loop {
        // Sleep until the deadline, waking early on unpark
        loop {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }

        let tick = Tick {
            generation,
            elapsed: started.elapsed(),
        };
        if sender.send(tick).is_err() {
            return;
        }

        deadline += interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_for_tick(scheduler: &mut TickScheduler) -> Option<Tick> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(tick) = scheduler.try_next() {
                return Some(tick);
            }
            thread::sleep(Duration::from_millis(1));
        }
        None
    }

    #[test]
    fn test_idle_scheduler_delivers_nothing() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(5));
        assert!(!scheduler.active);
        thread::sleep(Duration::from_millis(20));
        assert!(scheduler.try_next().is_none());
    }

    #[test]
    fn test_ticks_after_start() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(5));
        scheduler.start().unwrap();

        let first = wait_for_tick(&mut scheduler).expect("no tick delivered");
        let second = wait_for_tick(&mut scheduler).expect("no tick delivered");
        assert_eq!(first.generation, scheduler.generation());
        assert!(second.elapsed > first.elapsed);
        assert!(first.elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn test_stop_drops_pending_ticks() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(2));
        scheduler.start().unwrap();
        thread::sleep(Duration::from_millis(30));

        scheduler.stop();
        thread::sleep(Duration::from_millis(30));
        assert!(scheduler.try_next().is_none());
        assert!(!scheduler.active);

        // stopping twice is harmless
        scheduler.stop();
    }

    #[test]
    fn test_stale_generation_rejected() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(5));
        scheduler.start().unwrap();
        let old = scheduler.generation();
        scheduler.start().unwrap();

        let stale = Tick {
            generation: old,
            elapsed: Duration::from_millis(5),
        };
        assert!(!scheduler.accepts(&stale));

        let tick = wait_for_tick(&mut scheduler).expect("no tick delivered");
        assert_eq!(tick.generation, old + 1);
    }

    #[test]
    fn test_restart_resets_elapsed() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(5));
        scheduler.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        scheduler.start().unwrap();
        let tick = wait_for_tick(&mut scheduler).expect("no tick delivered");
        assert!(tick.elapsed < Duration::from_millis(100));
    }

    #[test]
    fn test_zero_interval_refused() {
        let mut scheduler = TickScheduler::new(Duration::ZERO);
        assert!(scheduler.start().is_err());
        assert!(!scheduler.active);
        assert!(scheduler.cancel.is_none());
        assert!(scheduler.try_next().is_none());
    }

    #[test]
    fn test_elapsed_ms() {
        let tick = Tick {
            generation: 1,
            elapsed: Duration::from_micros(65_432_900),
        };
        assert_eq!(tick.elapsed_ms(), 65_432);
    }
}
