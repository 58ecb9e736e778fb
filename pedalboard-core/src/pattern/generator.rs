//! Generator capability and the note sequences it produces

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{Pitch, ResolvedContext, Time};

use super::builtin::{BlastBeat, HalfTime};

/// A single note inside a phrase, positioned in quarter-note beats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedNote {
    /// Start, measured from the beginning of the phrase
    pub offset: Time,
    pub duration: Time,
    pub pitch: Pitch,
    pub velocity: u8,
}

impl TimedNote {
    pub fn new(offset: Time, duration: Time, pitch: Pitch, velocity: u8) -> Self {
        Self {
            offset,
            duration,
            pitch,
            velocity,
        }
    }
}

/// Produces the concrete notes of a pattern for a given context and length.
///
/// Implementations must be deterministic for equal inputs; the dispatcher
/// calls `generate` once per pattern activation.
pub trait Generator: Send + Sync {
    /// Identifier used by controls to select this generator
    fn name(&self) -> &str;

    fn generate(&self, context: &ResolvedContext, length_in_measures: u32) -> Vec<TimedNote>;
}

/// A materialized, finite note sequence.
///
/// Cheap to clone; [`Phrase::iter`] restarts from the first note every time
/// it is called, which is how looping playback replays it.
#[derive(Clone)]
pub struct Phrase {
    notes: Arc<[TimedNote]>,
    length: Time,
}

impl Phrase {
    /// Build a phrase; notes are ordered by offset and anything at or past
    /// `length` is dropped
    pub fn new(mut notes: Vec<TimedNote>, length: Time) -> Self {
        notes.retain(|n| n.offset < length && n.offset >= Time::from_integer(0));
        notes.sort_by(|a, b| a.offset.cmp(&b.offset));
        Self {
            notes: notes.into(),
            length,
        }
    }

    /// Total length in quarter-note beats
    pub fn length(&self) -> Time {
        self.length
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimedNote> {
        self.notes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedNote> {
        self.notes.iter()
    }
}

impl<'a> IntoIterator for &'a Phrase {
    type Item = &'a TimedNote;
    type IntoIter = std::slice::Iter<'a, TimedNote>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phrase")
            .field("notes", &self.notes.len())
            .field("length", &self.length)
            .finish()
    }
}

/// Generators available to the configuration builder, by name
#[derive(Clone, Default)]
pub struct GeneratorLibrary {
    generators: HashMap<String, Arc<dyn Generator>>,
}

impl GeneratorLibrary {
    /// An empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// A library holding `HALF_TIME` and `BLAST_BEAT`
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        library.register(Arc::new(HalfTime));
        library.register(Arc::new(BlastBeat));
        library
    }

    /// Add or replace a generator under its own name
    pub fn register(&mut self, generator: Arc<dyn Generator>) {
        self.generators
            .insert(Self::key(generator.name()), generator);
    }

    /// Case-insensitive lookup; `half-time` finds `HALF_TIME`
    pub fn get(&self, name: &str) -> Option<Arc<dyn Generator>> {
        self.generators.get(&Self::key(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(&Self::key(name))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.values().map(|g| g.name()).collect();
        names.sort_unstable();
        names
    }

    fn key(name: &str) -> String {
        name.trim().to_uppercase().replace('-', "_")
    }
}

impl fmt::Debug for GeneratorLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorLibrary")
            .field("generators", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{beats, time};

    fn note(offset: Time) -> TimedNote {
        TimedNote::new(offset, time(1, 4), Pitch::of(36), 100)
    }

    #[test]
    fn test_phrase_sorts_and_trims() {
        let phrase = Phrase::new(
            vec![note(beats(3)), note(beats(0)), note(beats(4)), note(time(1, 2))],
            beats(4),
        );
        let offsets: Vec<Time> = phrase.iter().map(|n| n.offset).collect();
        assert_eq!(offsets, vec![beats(0), time(1, 2), beats(3)]);
    }

    #[test]
    fn test_phrase_is_restartable() {
        let phrase = Phrase::new(vec![note(beats(0)), note(beats(1))], beats(2));
        let first: Vec<_> = phrase.iter().collect();
        let second: Vec<_> = (&phrase).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(phrase.clone().len(), 2);
    }

    #[test]
    fn test_library_lookup_is_case_insensitive() {
        let library = GeneratorLibrary::with_builtins();
        assert!(library.contains("HALF_TIME"));
        assert!(library.contains("half-time"));
        assert!(library.contains("Blast_Beat"));
        assert!(!library.contains("SHUFFLE"));
        assert_eq!(library.names(), vec!["BLAST_BEAT", "HALF_TIME"]);
    }

    struct Silence;

    impl Generator for Silence {
        fn name(&self) -> &str {
            "SILENCE"
        }

        fn generate(&self, _context: &ResolvedContext, _length: u32) -> Vec<TimedNote> {
            Vec::new()
        }
    }

    #[test]
    fn test_register_custom_generator() {
        let mut library = GeneratorLibrary::new();
        assert!(library.get("silence").is_none());
        library.register(Arc::new(Silence));
        assert_eq!(library.get("silence").unwrap().name(), "SILENCE");
    }
}
