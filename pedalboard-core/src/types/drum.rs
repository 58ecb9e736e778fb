//! Drum kit pieces and their General MIDI percussion notes
//!
//! `Hit` controls name the pieces they may strike; generators use the same
//! pieces to write grooves.

use std::fmt;

use crate::types::pitch::Pitch;

/// One piece of the drum kit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DrumPiece {
    /// Bass drum (GM 36)
    Kick,
    /// Acoustic snare (GM 38)
    Snare,
    /// Side stick (GM 37)
    SideStick,
    /// Closed hi-hat (GM 42)
    ClosedHiHat,
    /// Pedal hi-hat (GM 44)
    PedalHiHat,
    /// Open hi-hat (GM 46)
    OpenHiHat,
    /// High tom (GM 50)
    HighTom,
    /// Mid tom (GM 47)
    MidTom,
    /// Floor tom (GM 43)
    FloorTom,
    /// Crash cymbal 1 (GM 49)
    Crash,
    /// Crash cymbal 2 (GM 57)
    CrashAlt,
    /// Ride cymbal (GM 51)
    Ride,
    /// Ride bell (GM 53)
    RideBell,
    /// China cymbal (GM 52)
    China,
    /// Splash cymbal (GM 55)
    Splash,
}

impl DrumPiece {
    pub const ALL: [DrumPiece; 15] = [
        DrumPiece::Kick,
        DrumPiece::Snare,
        DrumPiece::SideStick,
        DrumPiece::ClosedHiHat,
        DrumPiece::PedalHiHat,
        DrumPiece::OpenHiHat,
        DrumPiece::HighTom,
        DrumPiece::MidTom,
        DrumPiece::FloorTom,
        DrumPiece::Crash,
        DrumPiece::CrashAlt,
        DrumPiece::Ride,
        DrumPiece::RideBell,
        DrumPiece::China,
        DrumPiece::Splash,
    ];

    /// Parse a piece from its name or a common abbreviation (case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kick" | "bd" | "bass" | "bass_drum" => Some(DrumPiece::Kick),
            "snare" | "sd" | "sn" => Some(DrumPiece::Snare),
            "side_stick" | "sidestick" | "rim" | "rs" => Some(DrumPiece::SideStick),
            "closed_hihat" | "hihat" | "hh" | "ch" => Some(DrumPiece::ClosedHiHat),
            "pedal_hihat" | "ph" => Some(DrumPiece::PedalHiHat),
            "open_hihat" | "oh" => Some(DrumPiece::OpenHiHat),
            "high_tom" | "ht" => Some(DrumPiece::HighTom),
            "mid_tom" | "mt" => Some(DrumPiece::MidTom),
            "floor_tom" | "ft" | "lt" => Some(DrumPiece::FloorTom),
            "crash" | "cr" => Some(DrumPiece::Crash),
            "crash_alt" | "crash2" => Some(DrumPiece::CrashAlt),
            "ride" | "rd" => Some(DrumPiece::Ride),
            "ride_bell" | "bell" => Some(DrumPiece::RideBell),
            "china" | "cn" => Some(DrumPiece::China),
            "splash" | "sp" => Some(DrumPiece::Splash),
            _ => None,
        }
    }

    /// General MIDI percussion note (channel 10)
    pub fn midi_note(&self) -> u8 {
        match self {
            DrumPiece::Kick => 36,
            DrumPiece::SideStick => 37,
            DrumPiece::Snare => 38,
            DrumPiece::ClosedHiHat => 42,
            DrumPiece::FloorTom => 43,
            DrumPiece::PedalHiHat => 44,
            DrumPiece::OpenHiHat => 46,
            DrumPiece::MidTom => 47,
            DrumPiece::Crash => 49,
            DrumPiece::HighTom => 50,
            DrumPiece::Ride => 51,
            DrumPiece::China => 52,
            DrumPiece::RideBell => 53,
            DrumPiece::Splash => 55,
            DrumPiece::CrashAlt => 57,
        }
    }

    pub fn pitch(&self) -> Pitch {
        Pitch::of(self.midi_note())
    }

    /// Display name used in button labels
    pub fn name(&self) -> &'static str {
        match self {
            DrumPiece::Kick => "kick",
            DrumPiece::Snare => "snare",
            DrumPiece::SideStick => "side stick",
            DrumPiece::ClosedHiHat => "hi-hat",
            DrumPiece::PedalHiHat => "pedal hi-hat",
            DrumPiece::OpenHiHat => "open hi-hat",
            DrumPiece::HighTom => "high tom",
            DrumPiece::MidTom => "mid tom",
            DrumPiece::FloorTom => "floor tom",
            DrumPiece::Crash => "crash",
            DrumPiece::CrashAlt => "crash 2",
            DrumPiece::Ride => "ride",
            DrumPiece::RideBell => "ride bell",
            DrumPiece::China => "china",
            DrumPiece::Splash => "splash",
        }
    }
}

impl fmt::Display for DrumPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
