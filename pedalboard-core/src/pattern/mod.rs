//! Patterns: named grooves and fills bound to a context, a length and a generator

pub mod builtin;
pub mod generator;
pub mod registry;

pub use builtin::{BlastBeat, HalfTime};
pub use generator::{Generator, GeneratorLibrary, Phrase, TimedNote};
pub use registry::{Materialized, Pattern, PatternRegistry, PatternRole};
