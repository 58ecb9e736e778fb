//! MIDI output processor
//!
//! Signals are queued to a dedicated output thread which owns the midir
//! connection. The thread holds each signal until its timestamp comes due,
//! so the dispatcher can hand over a note-off for later without blocking.

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, warn};
use midir::{MidiOutput, MidiOutputConnection};
use pedalboard_core::{Channel, NoteKind, Pitch, Signal};
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::Processor;
use crate::clock::TimeSource;

const CLIENT_NAME: &str = "Pedalboard";

/// All Notes Off controller number
const ALL_NOTES_OFF: u8 = 123;

/// How long `connect` waits for the output thread to answer
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands for the MIDI output thread
#[derive(Debug)]
enum MidiCommand {
    /// Replies with the full port name once connected
    Connect {
        port_name: String,
        reply: Sender<Result<String>>,
    },
    Signal(Signal),
    /// CC 123 on every channel; drops anything still queued
    PanicAll,
    Disconnect,
    Shutdown,
}

/// A signal waiting for its timestamp; ties keep arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    signal: Signal,
    sequence: u64,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.signal
            .timestamp
            .cmp(&other.signal.timestamp)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

type ActiveNotes = Arc<Mutex<HashSet<(u8, u8)>>>;

/// Find the first output port whose name contains `port_name`
fn find_port(midi_out: &MidiOutput, port_name: &str) -> Result<midir::MidiOutputPort> {
    midi_out
        .ports()
        .into_iter()
        .find(|p| {
            midi_out
                .port_name(p)
                .map(|name| name.contains(port_name))
                .unwrap_or(false)
        })
        .ok_or_else(|| anyhow!("MIDI port '{}' not found", port_name))
}

struct MidiOutputThread {
    connection: Option<MidiOutputConnection>,
    command_rx: Receiver<MidiCommand>,
    time: Arc<dyn TimeSource>,
    queue: BinaryHeap<Reverse<Pending>>,
    sequence: u64,
    active_notes: ActiveNotes,
}

impl MidiOutputThread {
    fn connect(&mut self, port_name: &str) -> Result<String> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let port = find_port(&midi_out, port_name)?;
        let actual_name = midi_out.port_name(&port)?;
        let connection = midi_out
            .connect(&port, "pedalboard-out")
            .map_err(|e| anyhow!("failed to connect to '{}': {}", port_name, e))?;
        // Release whatever the previous port was still holding
        self.all_notes_off();
        self.connection = Some(connection);
        Ok(actual_name)
    }

    fn run(&mut self) {
        loop {
            let command = match self.queue.peek() {
                Some(Reverse(next)) => {
                    let wait = next.signal.timestamp.since(self.time.now());
                    match self.command_rx.recv_timeout(Duration::from_millis(wait)) {
                        Ok(cmd) => Some(cmd),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.command_rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                },
            };

            match command {
                Some(MidiCommand::Connect { port_name, reply }) => {
                    let result = self.connect(&port_name);
                    if let Err(e) = &result {
                        error!("MIDI connect error: {}", e);
                    }
                    let _ = reply.send(result);
                }
                Some(MidiCommand::Signal(signal)) => {
                    self.queue.push(Reverse(Pending {
                        signal,
                        sequence: self.sequence,
                    }));
                    self.sequence += 1;
                }
                Some(MidiCommand::PanicAll) => {
                    self.queue.clear();
                    self.all_notes_off();
                }
                Some(MidiCommand::Disconnect) => {
                    self.all_notes_off();
                    self.connection = None;
                }
                Some(MidiCommand::Shutdown) => {
                    self.all_notes_off();
                    break;
                }
                None => {}
            }

            self.flush_due();
        }
    }

    /// Send every queued signal whose timestamp has been reached
    fn flush_due(&mut self) {
        let now = self.time.now();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.signal.timestamp > now {
                break;
            }
            if let Some(Reverse(pending)) = self.queue.pop() {
                self.send(&pending.signal);
            }
        }
    }

    fn send(&mut self, signal: &Signal) {
        let channel = signal.channel.index();
        let note = signal.pitch().midi();
        let message = match signal.event.kind {
            NoteKind::On => {
                self.mark(channel, note, true);
                [0x90 | (channel & 0x0F), note & 0x7F, signal.velocity() & 0x7F]
            }
            NoteKind::Off => {
                self.mark(channel, note, false);
                [0x80 | (channel & 0x0F), note & 0x7F, 0]
            }
        };
        if let Some(conn) = &mut self.connection {
            if let Err(e) = conn.send(&message) {
                warn!("MIDI send failed: {}", e);
            }
        }
    }

    fn mark(&self, channel: u8, note: u8, on: bool) {
        if let Ok(mut notes) = self.active_notes.lock() {
            if on {
                notes.insert((channel, note));
            } else {
                notes.remove(&(channel, note));
            }
        }
    }

    fn all_notes_off(&mut self) {
        if let Some(conn) = &mut self.connection {
            for ch in 0..16u8 {
                let _ = conn.send(&[0xB0 | ch, ALL_NOTES_OFF, 0]);
            }
        }
        if let Ok(mut notes) = self.active_notes.lock() {
            notes.clear();
        }
    }
}

/// Thread-safe handle to the MIDI output thread
pub struct MidiProcessor {
    command_tx: Sender<MidiCommand>,
    thread: Mutex<Option<JoinHandle<()>>>,
    active_notes: ActiveNotes,
    port_name: RwLock<Option<String>>,
}

impl MidiProcessor {
    /// Start the output thread; signals are held until `time` reaches their
    /// timestamp. Not connected to any port yet.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        let (command_tx, command_rx) = unbounded();
        let active_notes: ActiveNotes = Arc::new(Mutex::new(HashSet::new()));

        let thread_notes = active_notes.clone();
        let thread = thread::spawn(move || {
            MidiOutputThread {
                connection: None,
                command_rx,
                time,
                queue: BinaryHeap::new(),
                sequence: 0,
                active_notes: thread_notes,
            }
            .run();
        });

        Self {
            command_tx,
            thread: Mutex::new(Some(thread)),
            active_notes,
            port_name: RwLock::new(None),
        }
    }

    /// List available MIDI output ports.
    ///
    /// Creating a MIDI client occasionally fails on macOS, so this retries a
    /// few times.
    pub fn list_ports() -> Result<Vec<String>> {
        let mut last_err = None;
        for attempt in 0..3 {
            if attempt > 0 {
                thread::sleep(Duration::from_millis(100));
            }
            match MidiOutput::new(CLIENT_NAME) {
                Ok(midi_out) => {
                    return Ok(midi_out
                        .ports()
                        .iter()
                        .filter_map(|p| midi_out.port_name(p).ok())
                        .collect());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(anyhow!(
            "MIDI initialization failed after 3 attempts: {:?}",
            last_err
        ))
    }

    /// Connect to an output port by (partial) name; returns the full name.
    ///
    /// Waits for the output thread, so a port that fails to open leaves the
    /// previous connection (if any) in place and reports the error.
    pub fn connect(&self, port_name: &str) -> Result<String> {
        let (reply, result) = bounded(1);
        self.command_tx
            .send(MidiCommand::Connect {
                port_name: port_name.to_string(),
                reply,
            })
            .map_err(|e| anyhow!("failed to send connect command: {}", e))?;
        let actual_name = result
            .recv_timeout(CONNECT_TIMEOUT)
            .map_err(|e| anyhow!("MIDI output thread did not answer: {}", e))??;

        if let Ok(mut stored) = self.port_name.write() {
            *stored = Some(actual_name.clone());
        }
        debug!("MIDI output connected to {}", actual_name);
        Ok(actual_name)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.command_tx
            .send(MidiCommand::Disconnect)
            .map_err(|e| anyhow!("failed to send disconnect: {}", e))?;
        if let Ok(mut stored) = self.port_name.write() {
            *stored = None;
        }
        Ok(())
    }

    pub fn connected_port(&self) -> Option<String> {
        self.port_name.read().ok().and_then(|p| p.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.connected_port().is_some()
    }

    /// All Notes Off on every channel, dropping anything still scheduled
    pub fn panic_all(&self) -> Result<()> {
        self.command_tx
            .send(MidiCommand::PanicAll)
            .map_err(|e| anyhow!("failed to send all notes off: {}", e))
    }

    /// Number of notes currently held on
    pub fn active_note_count(&self) -> usize {
        self.active_notes.lock().map(|n| n.len()).unwrap_or(0)
    }
}

impl Processor for MidiProcessor {
    fn process(&self, signal: Signal) {
        if self.command_tx.send(MidiCommand::Signal(signal)).is_err() {
            warn!("MIDI output thread is gone, dropping {}", signal);
        }
    }

    fn is_sounding(&self, channel: Channel, pitch: Pitch) -> bool {
        self.active_notes
            .lock()
            .map(|n| n.contains(&(channel.index(), pitch.midi())))
            .unwrap_or(false)
    }
}

impl Drop for MidiProcessor {
    fn drop(&mut self) {
        let _ = self.command_tx.send(MidiCommand::Shutdown);
        if let Ok(mut thread) = self.thread.lock() {
            if let Some(thread) = thread.take() {
                let _ = thread.join();
            }
        }
    }
}
