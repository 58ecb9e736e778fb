//! Dispatcher thread
//!
//! A single thread owns the [`LiveDispatcher`] and selects over press
//! commands and clock ticks, so presses are handled one at a time in
//! arrival order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::warn;
use pedalboard_core::Configuration;

use super::{LiveDispatcher, PlaybackState, StateChange};
use crate::clock::{ClockTick, TimeSource};
use crate::processor::Processor;

/// Commands accepted by the dispatcher thread
#[derive(Debug)]
pub enum DispatchCommand {
    /// Press a trigger key; `None` uses the configured default velocity
    Press { key: u8, velocity: Option<u8> },
    /// Replace the configuration (stops playback first)
    Reload(Arc<Configuration>),
    /// Stop playback right away
    Stop,
    Subscribe(Sender<StateChange>),
    Shutdown,
}

/// Cloneable handle for talking to the dispatcher thread
#[derive(Clone)]
pub struct DispatcherHandle {
    command_tx: Sender<DispatchCommand>,
    state: Arc<RwLock<PlaybackState>>,
    configuration: Arc<RwLock<Arc<Configuration>>>,
    is_running: Arc<AtomicBool>,
}

impl DispatcherHandle {
    /// Move `dispatcher` onto its own thread
    pub fn spawn<P: Processor + 'static>(
        dispatcher: LiveDispatcher<P>,
        time: Arc<dyn TimeSource>,
        ticks: Receiver<ClockTick>,
    ) -> DispatcherHandle {
        let (command_tx, command_rx) = unbounded();
        let state = Arc::new(RwLock::new(dispatcher.state().clone()));
        let configuration = Arc::new(RwLock::new(Arc::clone(dispatcher.configuration())));
        let is_running = Arc::new(AtomicBool::new(true));

        let worker = DispatchThread {
            dispatcher,
            time,
            command_rx,
            ticks,
            state: state.clone(),
            configuration: configuration.clone(),
            is_running: is_running.clone(),
        };
        thread::spawn(move || worker.run_loop());

        DispatcherHandle {
            command_tx,
            state,
            configuration,
            is_running,
        }
    }

    pub fn press(&self, key: u8, velocity: Option<u8>) {
        let _ = self
            .command_tx
            .send(DispatchCommand::Press { key, velocity });
    }

    pub fn reload(&self, configuration: Arc<Configuration>) {
        let _ = self.command_tx.send(DispatchCommand::Reload(configuration));
    }

    pub fn stop(&self) {
        let _ = self.command_tx.send(DispatchCommand::Stop);
    }

    /// State as of the last handled command or tick
    pub fn state(&self) -> PlaybackState {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// The configuration currently in use
    pub fn configuration(&self) -> Arc<Configuration> {
        match self.configuration.read() {
            Ok(config) => Arc::clone(&config),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn subscribe(&self) -> Receiver<StateChange> {
        let (tx, rx) = unbounded();
        let _ = self.command_tx.send(DispatchCommand::Subscribe(tx));
        rx
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.send(DispatchCommand::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }
}

struct DispatchThread<P: Processor> {
    dispatcher: LiveDispatcher<P>,
    time: Arc<dyn TimeSource>,
    command_rx: Receiver<DispatchCommand>,
    ticks: Receiver<ClockTick>,
    state: Arc<RwLock<PlaybackState>>,
    configuration: Arc<RwLock<Arc<Configuration>>>,
    is_running: Arc<AtomicBool>,
}

impl<P: Processor> DispatchThread<P> {
    fn run_loop(mut self) {
        loop {
            let mut clock_gone = false;
            crossbeam_channel::select! {
                recv(self.command_rx) -> msg => match msg {
                    Ok(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(self.ticks) -> msg => match msg {
                    Ok(tick) => self.dispatcher.tick(tick.at),
                    Err(_) => clock_gone = true,
                },
            }
            if clock_gone {
                // Keep serving presses without a clock
                self.ticks = crossbeam_channel::never();
            }
            self.publish_state();
        }

        let now = self.time.now();
        self.dispatcher.stop(now);
        self.publish_state();
        self.is_running.store(false, Ordering::Relaxed);
    }

    /// Handle a command, returns false if the thread should exit
    fn handle_command(&mut self, cmd: DispatchCommand) -> bool {
        let now = self.time.now();
        match cmd {
            DispatchCommand::Press { key, velocity } => {
                let velocity = velocity.unwrap_or(self.dispatcher.settings().velocity);
                if let Err(e) = self.dispatcher.on_button_pressed(key, velocity, now) {
                    warn!("press aborted: {}", e);
                }
            }
            DispatchCommand::Reload(configuration) => {
                // Publish first so subscribers woken by the stop see the new one
                match self.configuration.write() {
                    Ok(mut current) => *current = Arc::clone(&configuration),
                    Err(poisoned) => *poisoned.into_inner() = Arc::clone(&configuration),
                }
                self.dispatcher.replace_configuration(configuration, now);
            }
            DispatchCommand::Stop => self.dispatcher.stop(now),
            DispatchCommand::Subscribe(tx) => self.dispatcher.add_subscriber(tx),
            DispatchCommand::Shutdown => return false,
        }
        true
    }

    fn publish_state(&self) {
        let current = self.dispatcher.state();
        if let Ok(mut shared) = self.state.write() {
            if *shared != *current {
                *shared = current.clone();
            }
        }
    }
}
