//! Time sources and the tick clock that drives pattern playback
//!
//! The tick clock runs in its own thread and broadcasts [`ClockTick`]s to
//! every subscriber at a fixed resolution. The dispatcher advances pattern
//! playback and fires deferred transitions on each tick.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use pedalboard_core::Timestamp;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default tick interval
pub const DEFAULT_RESOLUTION: Duration = Duration::from_millis(5);

/// Where "now" comes from. Shared between the dispatcher, the clock and
/// processors so they agree on one timeline.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Milliseconds since construction, from [`Instant`]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_millis() as u64)
    }
}

/// Time that only moves when told to
#[derive(Debug, Default)]
pub struct ManualTime {
    now: AtomicU64,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(ms: u64) -> Self {
        Self {
            now: AtomicU64::new(ms),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at.millis(), Ordering::SeqCst);
    }

    /// Move forward by `ms` and return the new time
    pub fn advance(&self, ms: u64) -> Timestamp {
        Timestamp(self.now.fetch_add(ms, Ordering::SeqCst) + ms)
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// A single clock tick broadcast to all subscribers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTick {
    pub at: Timestamp,
    /// Ticks since the clock was first started
    pub sequence: u64,
}

#[derive(Debug)]
enum ClockCommand {
    Start,
    Stop,
    AddSubscriber(Sender<ClockTick>),
    Shutdown,
}

/// Fixed-rate tick source running on its own thread
pub struct TickClock {
    running: Arc<AtomicBool>,
    command_tx: Sender<ClockCommand>,
    resolution: Duration,
    thread: Option<JoinHandle<()>>,
}

impl TickClock {
    /// Create a stopped clock ticking every `resolution`
    pub fn new(time: Arc<dyn TimeSource>, resolution: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = crossbeam_channel::bounded(64);
        let resolution = resolution.max(Duration::from_millis(1));

        let thread_running = running.clone();
        let thread = thread::spawn(move || {
            ClockThread {
                time,
                resolution,
                running: thread_running,
                command_rx,
                subscribers: Vec::new(),
                sequence: 0,
            }
            .run();
        });

        TickClock {
            running,
            command_tx,
            resolution,
            thread: Some(thread),
        }
    }

    /// New receiver that gets every tick from now on
    pub fn subscribe(&self) -> Receiver<ClockTick> {
        let (tx, rx) = unbounded();
        let _ = self.command_tx.send(ClockCommand::AddSubscriber(tx));
        rx
    }

    pub fn start(&self) {
        let _ = self.command_tx.send(ClockCommand::Start);
    }

    pub fn stop(&self) {
        let _ = self.command_tx.send(ClockCommand::Stop);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn resolution(&self) -> Duration {
        self.resolution
    }
}

impl Drop for TickClock {
    fn drop(&mut self) {
        let _ = self.command_tx.send(ClockCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct ClockThread {
    time: Arc<dyn TimeSource>,
    resolution: Duration,
    running: Arc<AtomicBool>,
    command_rx: Receiver<ClockCommand>,
    subscribers: Vec<Sender<ClockTick>>,
    sequence: u64,
}

impl ClockThread {
    fn run(&mut self) {
        let mut next_tick: Option<Instant> = None;

        loop {
            let command = match next_tick {
                // Running: wait for a command at most until the next tick is due
                Some(target) => {
                    let timeout = target.saturating_duration_since(Instant::now());
                    match self.command_rx.recv_timeout(timeout) {
                        Ok(cmd) => Some(cmd),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                // Stopped: block until told otherwise
                None => match self.command_rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                },
            };

            match command {
                Some(ClockCommand::Start) => {
                    if next_tick.is_none() {
                        next_tick = Some(Instant::now());
                    }
                    self.running.store(true, Ordering::Relaxed);
                }
                Some(ClockCommand::Stop) => {
                    next_tick = None;
                    self.running.store(false, Ordering::Relaxed);
                }
                Some(ClockCommand::AddSubscriber(tx)) => self.subscribers.push(tx),
                Some(ClockCommand::Shutdown) => break,
                None => {
                    self.emit_tick();
                    next_tick = next_tick.map(|t| {
                        let next = t + self.resolution;
                        // Don't try to catch up on ticks missed while descheduled
                        next.max(Instant::now())
                    });
                }
            }
        }

        self.running.store(false, Ordering::Relaxed);
    }

    fn emit_tick(&mut self) {
        let tick = ClockTick {
            at: self.time.now(),
            sequence: self.sequence,
        };
        self.sequence += 1;
        // Broadcast, dropping disconnected subscribers
        self.subscribers.retain(|tx| tx.send(tick).is_ok());
    }
}
