//! MIDI pitch identity
//!
//! A [`Pitch`] is nothing more than a MIDI note number (0-127). Note name and
//! octave are derived on demand; equality, ordering and hashing all go
//! through the note number.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Highest valid MIDI note number
pub const MAX_NOTE: u8 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// An immutable MIDI note number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Pitch(u8);

impl Pitch {
    /// Middle C (C4)
    pub const MIDDLE_C: Pitch = Pitch(60);

    /// Create a pitch, rejecting note numbers above 127
    pub fn new(midi: u8) -> Result<Self, ConfigurationError> {
        if midi > MAX_NOTE {
            return Err(ConfigurationError::InvalidPitch(midi));
        }
        Ok(Pitch(midi))
    }

    /// Create a pitch, clamping to the valid range
    pub const fn of(midi: u8) -> Self {
        if midi > MAX_NOTE {
            Pitch(MAX_NOTE)
        } else {
            Pitch(midi)
        }
    }

    /// The MIDI note number
    pub fn midi(&self) -> u8 {
        self.0
    }

    /// Chromatic pitch class (0 = C … 11 = B)
    pub fn pitch_class(&self) -> u8 {
        self.0 % 12
    }

    /// Note name without octave, sharps preferred
    pub fn note_name(&self) -> &'static str {
        NOTE_NAMES[self.pitch_class() as usize]
    }

    /// Octave in scientific pitch notation (MIDI 60 = C4, MIDI 0 = C-1)
    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note_name(), self.octave())
    }
}

impl TryFrom<u8> for Pitch {
    type Error = ConfigurationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Pitch::new(value)
    }
}

impl From<Pitch> for u8 {
    fn from(pitch: Pitch) -> Self {
        pitch.0
    }
}

/// Error returned when a pitch string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse '{0}' as a pitch")]
pub struct ParsePitchError(pub String);

impl FromStr for Pitch {
    type Err = ParsePitchError;

    /// Accepts a bare note number (`"60"`) or a note name (`"C4"`, `"Eb2"`, `"F#3"`, `"C-1"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParsePitchError(s.to_string());

        if let Ok(number) = s.parse::<u8>() {
            return Pitch::new(number).map_err(|_| err());
        }

        let mut chars = s.chars();
        let base: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(err()),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = if let Some(r) = rest.strip_prefix('#') {
            (1, r)
        } else if let Some(r) = rest.strip_prefix('b') {
            (-1, r)
        } else {
            (0, rest)
        };

        let octave: i32 = octave_str.parse().map_err(|_| err())?;
        let midi = (octave + 1) * 12 + base + accidental;
        if !(0..=MAX_NOTE as i32).contains(&midi) {
            return Err(err());
        }
        Ok(Pitch(midi as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Pitch::new(127).is_ok());
        assert_eq!(Pitch::new(128), Err(ConfigurationError::InvalidPitch(128)));
    }

    #[test]
    fn test_of_clamps() {
        assert_eq!(Pitch::of(200).midi(), 127);
        assert_eq!(Pitch::of(36).midi(), 36);
    }

    #[test]
    fn test_name_and_octave() {
        assert_eq!(Pitch::MIDDLE_C.to_string(), "C4");
        assert_eq!(Pitch::of(61).to_string(), "C#4");
        assert_eq!(Pitch::of(0).to_string(), "C-1");
        assert_eq!(Pitch::of(127).to_string(), "G9");
        assert_eq!(Pitch::of(69).note_name(), "A");
        assert_eq!(Pitch::of(69).octave(), 4);
    }

    #[test]
    fn test_parse() {
        assert_eq!("C4".parse::<Pitch>().unwrap().midi(), 60);
        assert_eq!("Eb2".parse::<Pitch>().unwrap().midi(), 39);
        assert_eq!("F#3".parse::<Pitch>().unwrap().midi(), 54);
        assert_eq!("C-1".parse::<Pitch>().unwrap().midi(), 0);
        assert_eq!("64".parse::<Pitch>().unwrap().midi(), 64);
        assert!("H2".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert!("200".parse::<Pitch>().is_err());
        assert!("A9".parse::<Pitch>().is_err());
    }

    #[test]
    fn test_equality_by_number() {
        assert_eq!("D#4".parse::<Pitch>().unwrap(), "Eb4".parse::<Pitch>().unwrap());
        assert!(Pitch::of(60) < Pitch::of(61));
    }
}
