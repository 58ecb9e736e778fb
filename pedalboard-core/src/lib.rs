//! # Pedalboard Core
//!
//! Action binding model for a foot-pedal drum accompaniment controller.
//! Compiles a declarative list of pedal controls into an immutable
//! [`Configuration`]: a pattern registry plus an O(1) action table keyed by
//! trigger note. No threads, no I/O; the live dispatcher lives in the host
//! crate.
//!
//! ## Features
//!
//! - **serde**: derive `Serialize`/`Deserialize` for control specifications
//!
//! ## Example
//!
//! ```ignore
//! use pedalboard_core::{Configuration, Control, GeneratorLibrary, TimeSignature};
//!
//! let controls = vec![Control::play(60, "Verse", "HALF_TIME", 4)];
//! let config = Configuration::build(
//!     "Practice",
//!     120,
//!     TimeSignature::COMMON,
//!     &controls,
//!     &GeneratorLibrary::with_builtins(),
//! )?;
//! assert!(config.action(60).is_some());
//! ```

pub mod action;
pub mod config;
pub mod control;
pub mod error;
pub mod pattern;
pub mod signal;
pub mod types;

// Re-export commonly used types
pub use action::{Action, ActionTable, SwitchMode};
pub use config::{Binding, Configuration};
pub use control::{Control, ControlCommand};
pub use error::{ConfigurationError, ConfigurationErrors, ContextField};
pub use pattern::{
    Generator, GeneratorLibrary, Materialized, Pattern, PatternRegistry, PatternRole, Phrase,
    TimedNote,
};
pub use signal::{Channel, NoteEvent, NoteKind, Played, Signal, HOLD_MS};
pub use types::{Context, DrumPiece, Pitch, ResolvedContext, Time, TimeSignature, Timestamp};
