//! # Pedalboard
//!
//! Live accompaniment driven by a MIDI foot pedal. Each button sends a
//! trigger key; the configuration maps keys to actions (start a pattern,
//! hit a drum, finish, stop) and the dispatcher turns presses into timed
//! note signals for a processor such as a MIDI output port.
//!
//! ## Modules
//!
//! - `clock`: Time sources and the tick thread that drives playback.
//! - `commands`: Command registry for the interactive console.
//! - `dispatch`: The live dispatcher, its playback state machine and the
//!   thread that owns it.
//! - `pedalboard`: Pedalboard files, button layouts and hot reloading.
//! - `processor`: Signal sinks (MIDI output, console, recorder).
//! - `repl`: Interactive console.
//!
//! Configuration building and pattern generation live in `pedalboard-core`.

pub mod clock;
pub mod commands;
pub mod dispatch;
pub mod logger;
pub mod pedalboard;
pub mod processor;
pub mod repl;

pub use crate::dispatch::{DispatcherHandle, LiveDispatcher, PlaybackState, StateChange};
pub use crate::processor::Processor;
