//! Musical and wall-clock time
//!
//! Pattern positions are exact rationals of quarter-note beats so that odd
//! meters (7/8, 5/16) never accumulate rounding drift. Conversion to
//! milliseconds happens only when a pattern is actually played, against a
//! [`ResolvedContext`] snapshot.

use std::fmt;
use std::str::FromStr;

use num_rational::Ratio;
use num_traits::ToPrimitive;

use crate::error::ConfigurationError;

/// Exact musical position or length, in quarter-note beats
pub type Time = Ratio<i64>;

/// Helper to create Time from a ratio n/d
#[inline]
pub fn time(n: i64, d: i64) -> Time {
    Ratio::new(n, d)
}

/// Create Time from whole quarter-note beats
#[inline]
pub fn beats(n: i64) -> Time {
    Ratio::from_integer(n)
}

/// Convert rational to f64 for scheduling
#[inline]
pub fn to_f64(t: Time) -> f64 {
    t.to_f64().unwrap_or(0.0)
}

/// Slowest and fastest accepted tempo
pub const MIN_TEMPO: u32 = 1;
pub const MAX_TEMPO: u32 = 400;

/// Validate a tempo in beats per minute
pub fn validate_tempo(tempo: u32) -> Result<u32, ConfigurationError> {
    if (MIN_TEMPO..=MAX_TEMPO).contains(&tempo) {
        Ok(tempo)
    } else {
        Err(ConfigurationError::InvalidTempo(tempo))
    }
}

/// Meter: beats per measure over the note value that gets one beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct TimeSignature {
    pub beats_per_measure: u8,
    pub beat_unit: u8,
}

impl TimeSignature {
    /// 4/4
    pub const COMMON: TimeSignature = TimeSignature {
        beats_per_measure: 4,
        beat_unit: 4,
    };

    /// Create a validated time signature
    pub fn new(beats_per_measure: u8, beat_unit: u8) -> Result<Self, ConfigurationError> {
        let signature = TimeSignature {
            beats_per_measure,
            beat_unit,
        };
        signature.validate()?;
        Ok(signature)
    }

    /// Check numerator is positive and the beat unit is a power of two up to 32
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let unit_ok = matches!(self.beat_unit, 1 | 2 | 4 | 8 | 16 | 32);
        if self.beats_per_measure == 0 || !unit_ok {
            return Err(ConfigurationError::InvalidTimeSignature {
                beats: self.beats_per_measure,
                unit: self.beat_unit,
            });
        }
        Ok(())
    }

    /// Length of one measure in quarter-note beats (7/8 → 7/2)
    pub fn measure_length(&self) -> Time {
        time(self.beats_per_measure as i64 * 4, self.beat_unit as i64)
    }

    /// Length of one beat unit in quarter-note beats (x/8 → 1/2)
    pub fn beat_length(&self) -> Time {
        time(4, self.beat_unit as i64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_measure, self.beat_unit)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(signature: TimeSignature) -> String {
        signature.to_string()
    }
}

impl FromStr for TimeSignature {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidTimeSignature { beats: 0, unit: 0 };
        let (beats, unit) = s.trim().split_once('/').ok_or_else(invalid)?;
        let beats: u8 = beats.trim().parse().map_err(|_| invalid())?;
        let unit: u8 = unit.trim().parse().map_err(|_| invalid())?;
        TimeSignature::new(beats, unit)
    }
}

/// Monotonic wall-clock time in milliseconds since the session started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn millis(&self) -> u64 {
        self.0
    }

    /// The instant `ms` milliseconds later (saturating)
    pub fn after_millis(&self, ms: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is later)
    pub fn since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Fully resolved tempo and meter, snapshotted from a [`super::Context`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedContext {
    pub tempo: u32,
    pub time_signature: TimeSignature,
}

impl ResolvedContext {
    pub fn new(tempo: u32, time_signature: TimeSignature) -> Self {
        Self {
            tempo,
            time_signature,
        }
    }

    /// Duration of one quarter note in milliseconds
    pub fn quarter_note_millis(&self) -> f64 {
        60_000.0 / self.tempo as f64
    }

    /// Convert a beat position/length to milliseconds
    pub fn beats_to_millis(&self, t: Time) -> f64 {
        to_f64(t) * self.quarter_note_millis()
    }

    /// Duration of one measure in milliseconds
    pub fn measure_millis(&self) -> f64 {
        self.beats_to_millis(self.time_signature.measure_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_length() {
        assert_eq!(TimeSignature::COMMON.measure_length(), beats(4));
        assert_eq!(TimeSignature::new(7, 8).unwrap().measure_length(), time(7, 2));
        assert_eq!(TimeSignature::new(3, 4).unwrap().measure_length(), beats(3));
        assert_eq!(TimeSignature::new(6, 8).unwrap().beat_length(), time(1, 2));
    }

    #[test]
    fn test_invalid_time_signatures() {
        assert!(TimeSignature::new(0, 4).is_err());
        assert!(TimeSignature::new(4, 3).is_err());
        assert!(TimeSignature::new(4, 64).is_err());
    }

    #[test]
    fn test_parse_time_signature() {
        assert_eq!("7/8".parse::<TimeSignature>().unwrap(), TimeSignature::new(7, 8).unwrap());
        assert_eq!(" 4 / 4 ".parse::<TimeSignature>().unwrap(), TimeSignature::COMMON);
        assert!("4-4".parse::<TimeSignature>().is_err());
        assert!("4/5".parse::<TimeSignature>().is_err());
        assert_eq!(TimeSignature::new(12, 8).unwrap().to_string(), "12/8");
    }

    #[test]
    fn test_tempo_bounds() {
        assert!(validate_tempo(0).is_err());
        assert!(validate_tempo(1).is_ok());
        assert!(validate_tempo(400).is_ok());
        assert_eq!(validate_tempo(401), Err(ConfigurationError::InvalidTempo(401)));
    }

    #[test]
    fn test_resolved_context_millis() {
        let ctx = ResolvedContext::new(120, TimeSignature::COMMON);
        assert_eq!(ctx.quarter_note_millis(), 500.0);
        assert_eq!(ctx.measure_millis(), 2000.0);
        assert_eq!(ctx.beats_to_millis(time(1, 2)), 250.0);

        let odd = ResolvedContext::new(60, TimeSignature::new(7, 8).unwrap());
        assert_eq!(odd.measure_millis(), 3500.0);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::from_millis(1_000);
        assert_eq!(t.after_millis(500), Timestamp(1_500));
        assert_eq!(t.since(Timestamp(400)), 600);
        assert_eq!(Timestamp(400).since(t), 0);
        assert_eq!(Timestamp(u64::MAX).after_millis(1), Timestamp(u64::MAX));
    }
}
