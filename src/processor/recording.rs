use std::collections::HashSet;
use std::sync::Mutex;

use pedalboard_core::{Channel, Pitch, Signal};

use super::Processor;

/// Keeps every signal in arrival order, for tests and offline runs
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    signals: Mutex<Vec<Signal>>,
    sounding: Mutex<HashSet<(Channel, Pitch)>>,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far
    pub fn signals(&self) -> Vec<Signal> {
        self.signals
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Drain and return everything received so far
    pub fn take(&self) -> Vec<Signal> {
        self.signals
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.signals.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pretend a sound source is busy (or idle again)
    pub fn set_sounding(&self, channel: Channel, pitch: Pitch, sounding: bool) {
        if let Ok(mut set) = self.sounding.lock() {
            if sounding {
                set.insert((channel, pitch));
            } else {
                set.remove(&(channel, pitch));
            }
        }
    }
}

impl Processor for RecordingProcessor {
    fn process(&self, signal: Signal) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.push(signal);
        }
    }

    fn is_sounding(&self, channel: Channel, pitch: Pitch) -> bool {
        self.sounding
            .lock()
            .map(|s| s.contains(&(channel, pitch)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::{Played, Timestamp};

    #[test]
    fn test_records_in_order_and_drains() {
        let recorder = RecordingProcessor::new();
        let played = Played::new(Pitch::MIDDLE_C, 100);
        let (on, off) = Signal::press_pair(Timestamp(0), Channel::default(), played);
        recorder.process(on);
        recorder.process(off);

        assert_eq!(recorder.signals(), vec![on, off]);
        assert_eq!(recorder.take().len(), 2);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_sounding_flags() {
        let recorder = RecordingProcessor::new();
        assert!(!recorder.is_sounding(Channel::DRUMS, Pitch::of(49)));
        recorder.set_sounding(Channel::DRUMS, Pitch::of(49), true);
        assert!(recorder.is_sounding(Channel::DRUMS, Pitch::of(49)));
        recorder.set_sounding(Channel::DRUMS, Pitch::of(49), false);
        assert!(!recorder.is_sounding(Channel::DRUMS, Pitch::of(49)));
    }
}
