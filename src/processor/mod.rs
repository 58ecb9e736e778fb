//! Signal consumers
//!
//! The dispatcher hands every [`Signal`] to a [`Processor`] it was
//! constructed with. Processors realize the signal (MIDI out, console) or
//! just keep it (recording).

pub mod console;
pub mod midi;
pub mod recording;

use std::sync::Arc;

use pedalboard_core::{Channel, Pitch, Signal};

pub use console::ConsoleProcessor;
pub use midi::MidiProcessor;
pub use recording::RecordingProcessor;

/// Accepts signals, fire-and-forget.
///
/// `process` must not block on playback: signals carry their own timestamps
/// and the processor is responsible for realizing them at that time.
pub trait Processor: Send + Sync {
    fn process(&self, signal: Signal);

    /// Whether `pitch` is currently sounding on `channel`. Processors that
    /// can't tell report everything idle.
    fn is_sounding(&self, _channel: Channel, _pitch: Pitch) -> bool {
        false
    }
}

impl<P: Processor + ?Sized> Processor for Arc<P> {
    fn process(&self, signal: Signal) {
        (**self).process(signal)
    }

    fn is_sounding(&self, channel: Channel, pitch: Pitch) -> bool {
        (**self).is_sounding(channel, pitch)
    }
}
