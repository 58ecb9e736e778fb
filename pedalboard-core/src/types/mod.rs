// pedalboard-core/src/types/mod.rs

pub mod context;
pub mod drum;
pub mod pitch;
pub mod time;

pub use context::Context;
pub use drum::DrumPiece;
pub use pitch::Pitch;
pub use time::{beats, time, to_f64, ResolvedContext, Time, TimeSignature, Timestamp};
