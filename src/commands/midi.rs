//! MIDI REPL commands

use crate::commands::{CommandContext, CommandResult};
use crate::processor::MidiProcessor;
use colored::*;

const NOT_INITIALIZED: &str = "MIDI output not initialized (running with --dry-run?)";

/// Handle `midi devices` command - list available MIDI output ports
pub fn cmd_midi_devices(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match MidiProcessor::list_ports() {
        Ok(ports) if ports.is_empty() => CommandResult::Message(
            "No MIDI output ports found. Make sure a MIDI device or virtual port is connected."
                .yellow()
                .to_string(),
        ),
        Ok(ports) => {
            let mut output = format!("{}\n", "🎹 Available MIDI Output Ports:".bold());
            for (i, port) in ports.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, port.cyan()));
            }
            output.push_str(&format!(
                "\n{} {}",
                "Use".dimmed(),
                "midi connect <port name>".green()
            ));
            CommandResult::Message(output)
        }
        Err(e) => CommandResult::Error(format!("Failed to list MIDI ports: {}", e)),
    }
}

/// Handle `midi connect <port>` command - connect to a MIDI output port
pub fn cmd_midi_connect(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error(
            "Usage: midi connect <port name>\nUse 'midi devices' to see available ports"
                .to_string(),
        );
    }

    match &ctx.midi {
        Some(midi) => match midi.connect(args) {
            Ok(name) => {
                CommandResult::Message(format!("🎹 Connected to MIDI port: {}", name.green()))
            }
            Err(e) => CommandResult::Error(format!("Failed to connect to '{}': {}", args, e)),
        },
        None => CommandResult::Error(NOT_INITIALIZED.to_string()),
    }
}

/// Handle `midi disconnect` command
pub fn cmd_midi_disconnect(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match &ctx.midi {
        Some(midi) => match midi.disconnect() {
            Ok(()) => CommandResult::Message("🎹 Disconnected from MIDI".to_string()),
            Err(e) => CommandResult::Error(format!("Failed to disconnect: {}", e)),
        },
        None => CommandResult::Error(NOT_INITIALIZED.to_string()),
    }
}

/// Handle `midi status` command
pub fn cmd_midi_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(midi) = &ctx.midi else {
        return CommandResult::Message(format!("🎹 MIDI: {}", "dry run".yellow()));
    };
    let port = match midi.connected_port() {
        Some(name) => name.green().to_string(),
        None => "not connected".dimmed().to_string(),
    };
    CommandResult::Message(format!(
        "🎹 MIDI: {}\n   Active notes: {}",
        port,
        midi.active_note_count()
    ))
}

/// Handle `midi panic` command - All Notes Off on every channel
pub fn cmd_midi_panic(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match &ctx.midi {
        Some(midi) => match midi.panic_all() {
            Ok(()) => CommandResult::Message("🛑 All notes off".yellow().to_string()),
            Err(e) => CommandResult::Error(format!("Failed to send all notes off: {}", e)),
        },
        None => CommandResult::Error(NOT_INITIALIZED.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_context;

    #[test]
    fn test_commands_without_midi_output() {
        let (mut ctx, _) = test_context(&[]);
        assert!(matches!(cmd_midi_connect("", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_midi_connect("IAC", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_midi_panic("", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_midi_status("", &mut ctx), CommandResult::Message(_)));
    }
}
