//! Command registry for REPL commands
//!
//! Commands are matched by prefix, longest first, so `midi connect` wins
//! over a hypothetical `midi`.

pub mod general;
pub mod midi;
pub mod pedal;

use crate::dispatch::DispatcherHandle;
use crate::pedalboard::ButtonLayout;
use crate::processor::MidiProcessor;
use pedalboard_core::GeneratorLibrary;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of executing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Command executed successfully, nothing to show
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// No command matched
    NotACommand,
    /// Error occurred
    Error(String),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub handle: DispatcherHandle,
    pub layout: ButtonLayout,
    pub generators: GeneratorLibrary,
    /// Pedalboard file the session was loaded from, for `reload`
    pub source: Option<PathBuf>,
    pub midi: Option<Arc<MidiProcessor>>,
}

impl CommandContext {
    pub fn new(handle: DispatcherHandle, layout: ButtonLayout, generators: GeneratorLibrary) -> Self {
        Self {
            handle,
            layout,
            generators,
            source: None,
            midi: None,
        }
    }

    pub fn with_source(mut self, path: PathBuf) -> Self {
        self.source = Some(path);
        self
    }

    pub fn with_midi(mut self, midi: Arc<MidiProcessor>) -> Self {
        self.midi = Some(midi);
        self
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every built-in command
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("press", pedal::cmd_press);
    registry.register("key", pedal::cmd_key);
    registry.register("buttons", pedal::cmd_buttons);
    registry.register("state", pedal::cmd_state);
    registry.register("stop", pedal::cmd_stop);
    registry.register("reload", pedal::cmd_reload);

    registry.register("midi devices", midi::cmd_midi_devices);
    registry.register("midi connect", midi::cmd_midi_connect);
    registry.register("midi disconnect", midi::cmd_midi_disconnect);
    registry.register("midi status", midi::cmd_midi_status);
    registry.register("midi panic", midi::cmd_midi_panic);

    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::ManualTime;
    use crate::dispatch::{LiveDispatcher, PlaybackState};
    use crate::processor::RecordingProcessor;
    use pedalboard_core::{Configuration, Control, TimeSignature};
    use std::time::Duration;

    /// A context wired to a live dispatcher thread with a recording processor
    pub(crate) fn test_context(controls: &[Control]) -> (CommandContext, Arc<RecordingProcessor>) {
        let generators = GeneratorLibrary::with_builtins();
        let config =
            Configuration::build("Test", 120, TimeSignature::COMMON, controls, &generators)
                .unwrap();
        let recorder = Arc::new(RecordingProcessor::new());
        let dispatcher = LiveDispatcher::new(Arc::new(config), recorder.clone());
        let handle = DispatcherHandle::spawn(
            dispatcher,
            Arc::new(ManualTime::new()),
            crossbeam_channel::never(),
        );
        (
            CommandContext::new(handle, ButtonLayout::default(), generators),
            recorder,
        )
    }

    #[test]
    fn test_prefix_matching() {
        let registry = create_registry();
        let (mut ctx, _) = test_context(&[]);

        assert_eq!(registry.execute("quit", &mut ctx), CommandResult::Exit);
        assert_eq!(registry.execute("quitter", &mut ctx), CommandResult::NotACommand);
        assert_eq!(registry.execute("dance", &mut ctx), CommandResult::NotACommand);
        assert!(registry.list_commands().contains(&"midi connect"));
    }

    #[test]
    fn test_press_reaches_dispatcher() {
        let registry = create_registry();
        let (mut ctx, recorder) = test_context(&[Control::play(60, "Verse", "HALF_TIME", 1)]);
        let changes = ctx.handle.subscribe();

        let result = registry.execute("press 1 90", &mut ctx);
        assert!(matches!(result, CommandResult::Message(_)));

        let change = changes.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(change.to, PlaybackState::Playing("Verse".to_string()));
        assert_eq!(recorder.signals()[0].velocity(), 90);
    }
}
