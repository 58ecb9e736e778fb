use colored::*;
use pedalboard_core::{NoteKind, Signal};

use super::Processor;

/// Prints signals instead of sounding them
#[derive(Debug, Default)]
pub struct ConsoleProcessor;

impl ConsoleProcessor {
    pub fn new() -> Self {
        Self
    }

    fn format(signal: &Signal) -> String {
        let kind = match signal.event.kind {
            NoteKind::On => "on ".bright_green(),
            NoteKind::Off => "off".dimmed(),
        };
        format!(
            "{:>8} {:>4} {} {:<4} vel {}",
            signal.timestamp.to_string().dimmed(),
            signal.channel.to_string().cyan(),
            kind,
            signal.pitch().to_string().bright_yellow(),
            signal.velocity()
        )
    }
}

impl Processor for ConsoleProcessor {
    fn process(&self, signal: Signal) {
        println!("{}", Self::format(&signal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::{Channel, Pitch, Played, Timestamp};

    #[test]
    fn test_format_mentions_note_and_channel() {
        colored::control::set_override(false);
        let (on, _) = Signal::press_pair(
            Timestamp(250),
            Channel::DRUMS,
            Played::new(Pitch::of(38), 90),
        );
        let line = ConsoleProcessor::format(&on);
        assert!(line.contains("ch10"));
        assert!(line.contains("D2"));
        assert!(line.contains("vel 90"));
    }
}
