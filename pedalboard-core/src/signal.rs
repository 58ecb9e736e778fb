//! Timestamped note events handed to a processor

use std::fmt;

use crate::error::ConfigurationError;
use crate::types::{Pitch, Timestamp};

/// How long a press-generated note is held before its note-off
pub const HOLD_MS: u64 = 500;

/// MIDI channel, 1-based as musicians count them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    /// General MIDI percussion channel
    pub const DRUMS: Channel = Channel(10);

    pub fn new(number: u8) -> Result<Self, ConfigurationError> {
        if (1..=16).contains(&number) {
            Ok(Channel(number))
        } else {
            Err(ConfigurationError::InvalidChannel(number))
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// 0-based channel nibble used in MIDI status bytes
    pub fn index(&self) -> u8 {
        self.0 - 1
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel(1)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// A pitch struck at a velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Played {
    pub pitch: Pitch,
    pub velocity: u8,
}

impl Played {
    pub fn new(pitch: Pitch, velocity: u8) -> Self {
        Self {
            pitch,
            velocity: velocity.min(127),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    pub played: Played,
    pub kind: NoteKind,
}

/// One note-on or note-off, stamped with the time it should sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    pub timestamp: Timestamp,
    pub channel: Channel,
    pub event: NoteEvent,
}

impl Signal {
    pub fn on(timestamp: Timestamp, channel: Channel, played: Played) -> Self {
        Self {
            timestamp,
            channel,
            event: NoteEvent {
                played,
                kind: NoteKind::On,
            },
        }
    }

    pub fn off(timestamp: Timestamp, channel: Channel, played: Played) -> Self {
        Self {
            timestamp,
            channel,
            event: NoteEvent {
                played,
                kind: NoteKind::Off,
            },
        }
    }

    /// The note-on at `now` and its note-off `HOLD_MS` later
    pub fn press_pair(now: Timestamp, channel: Channel, played: Played) -> (Signal, Signal) {
        Self::pair(now, HOLD_MS, channel, played)
    }

    /// On/off pair with an explicit hold; a zero hold is stretched to 1 ms so
    /// the off always lands after the on. At the very end of the timeline the
    /// pair is pulled back so the hold still fits.
    pub fn pair(now: Timestamp, hold_ms: u64, channel: Channel, played: Played) -> (Signal, Signal) {
        let hold_ms = hold_ms.max(1);
        let on_at = now.min(Timestamp(u64::MAX - hold_ms));
        (
            Signal::on(on_at, channel, played),
            Signal::off(on_at.after_millis(hold_ms), channel, played),
        )
    }

    pub fn is_on(&self) -> bool {
        self.event.kind == NoteKind::On
    }

    pub fn pitch(&self) -> Pitch {
        self.event.played.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.event.played.velocity
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.event.kind {
            NoteKind::On => "on ",
            NoteKind::Off => "off",
        };
        write!(
            f,
            "{} {} {} {} vel {}",
            self.timestamp,
            self.channel,
            kind,
            self.event.played.pitch,
            self.event.played.velocity
        )
    }
}
