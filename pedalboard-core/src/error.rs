//! Build-time error taxonomy.
//!
//! Every violation found while compiling a configuration is reported as a
//! [`ConfigurationError`]; the builder gathers them all into a single
//! [`ConfigurationErrors`] so an editor can surface every problem at once.

use std::fmt;

use thiserror::Error;

/// Which context field failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    Tempo,
    TimeSignature,
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextField::Tempo => write!(f, "tempo"),
            ContextField::TimeSignature => write!(f, "time signature"),
        }
    }
}

/// A single configuration violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("trigger key {key} is already bound to '{existing}' (duplicate: '{duplicate}')")]
    DuplicateTrigger {
        key: u8,
        existing: String,
        duplicate: String,
    },

    #[error("pattern '{name}' is already registered")]
    DuplicatePattern { name: String },

    #[error("unknown generator '{generator}' for pattern '{pattern}'")]
    UnknownGenerator { generator: String, pattern: String },

    #[error("context has no {field}: no override and no parent to inherit from")]
    UnresolvedContext { field: ContextField },

    #[error("unknown pattern '{name}'")]
    UnknownPattern { name: String },

    #[error("trigger key {key} is outside the MIDI note range 0-127")]
    InvalidTrigger { key: u8 },

    #[error("note number {0} is outside the MIDI note range 0-127")]
    InvalidPitch(u8),

    #[error("tempo {0} BPM is outside 1-400")]
    InvalidTempo(u32),

    #[error("invalid time signature {beats}/{unit}")]
    InvalidTimeSignature { beats: u8, unit: u8 },

    #[error("pattern '{name}' must be at least one measure long")]
    InvalidLength { name: String },

    #[error("velocity {0} is outside 1-127")]
    InvalidVelocity(u8),

    #[error("MIDI channel {0} is outside 1-16")]
    InvalidChannel(u8),

    #[error("hit on key {key} has no drum options")]
    EmptyHitOptions { key: u8 },
}

/// Aggregated build failure: one entry per violation, in discovery order.
///
/// Never empty when returned from [`crate::Configuration::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationErrors {
    name: String,
    errors: Vec<ConfigurationError>,
}

impl ConfigurationErrors {
    pub fn new(name: impl Into<String>, errors: Vec<ConfigurationError>) -> Self {
        Self {
            name: name.into(),
            errors,
        }
    }

    /// Name of the configuration that failed to build
    pub fn configuration(&self) -> &str {
        &self.name
    }

    pub fn errors(&self) -> &[ConfigurationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check whether any violation matches the predicate
    pub fn contains(&self, predicate: impl Fn(&ConfigurationError) -> bool) -> bool {
        self.errors.iter().any(predicate)
    }
}

impl fmt::Display for ConfigurationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration '{}' has {} error(s):",
            self.name,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationErrors {}

impl IntoIterator for ConfigurationErrors {
    type Item = ConfigurationError;
    type IntoIter = std::vec::IntoIter<ConfigurationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
