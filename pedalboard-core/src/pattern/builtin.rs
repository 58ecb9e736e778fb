//! Built-in drum figures.
//!
//! Deliberately plain: they exist so a pedalboard works out of the box.
//! Richer material (recorded grooves, humanized fills) plugs in through
//! [`super::GeneratorLibrary::register`].

use num_traits::Zero;

use crate::types::{time, DrumPiece, ResolvedContext, Time};

use super::generator::{Generator, TimedNote};

const ACCENT: u8 = 110;
const NORMAL: u8 = 90;
const GHOST: u8 = 64;

/// Half-time feel: kick on the downbeat, snare halfway through the measure,
/// hi-hat on every beat
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfTime;

impl Generator for HalfTime {
    fn name(&self) -> &str {
        "HALF_TIME"
    }

    fn generate(&self, context: &ResolvedContext, length_in_measures: u32) -> Vec<TimedNote> {
        let signature = context.time_signature;
        let measure = signature.measure_length();
        let beat = signature.beat_length();
        let hold = beat / 2;
        let mut notes = Vec::new();

        for m in 0..length_in_measures {
            let start = measure * Time::from_integer(m as i64);

            let mut position = Time::zero();
            while position < measure {
                let velocity = if position.is_zero() { ACCENT } else { NORMAL };
                notes.push(hit(start + position, hold, DrumPiece::ClosedHiHat, velocity));
                position += beat;
            }

            notes.push(hit(start, hold, DrumPiece::Kick, ACCENT));
            notes.push(hit(start + measure / 2, hold, DrumPiece::Snare, ACCENT));
        }

        notes
    }
}

/// Blast beat: kick and ride on every downstroke, snare on every upstroke,
/// crash opening the phrase
#[derive(Debug, Clone, Copy, Default)]
pub struct BlastBeat;

impl Generator for BlastBeat {
    fn name(&self) -> &str {
        "BLAST_BEAT"
    }

    fn generate(&self, context: &ResolvedContext, length_in_measures: u32) -> Vec<TimedNote> {
        let signature = context.time_signature;
        let total = signature.measure_length() * Time::from_integer(length_in_measures as i64);
        let step = signature.beat_length() / 2;
        let mut notes = Vec::new();

        if length_in_measures > 0 {
            notes.push(hit(Time::zero(), step, DrumPiece::Crash, ACCENT));
        }

        let mut position = Time::zero();
        let mut down = true;
        while position < total {
            if down {
                notes.push(hit(position, step, DrumPiece::Kick, NORMAL));
                notes.push(hit(position, step, DrumPiece::Ride, GHOST));
            } else {
                notes.push(hit(position, step, DrumPiece::Snare, NORMAL));
            }
            down = !down;
            position += step;
        }

        notes
    }
}

fn hit(offset: Time, duration: Time, piece: DrumPiece, velocity: u8) -> TimedNote {
    TimedNote::new(offset, duration.max(time(1, 32)), piece.pitch(), velocity)
}
