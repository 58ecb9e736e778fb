//! General REPL commands (help, quit)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

fn print_help() {
    println!("{}", "Pedalboard Help".bold());
    println!("{}", "===============".bold());
    println!();
    println!("{}", "Pedals:".green());
    println!(
        "  {}  - Press a physical button (1-5 by default)",
        "press <button> [velocity]".cyan()
    );
    println!(
        "  {}     - Send a trigger key directly (60 or C4)",
        "key <note> [velocity]".cyan()
    );
    println!("  {}                    - List buttons and what they do", "buttons".cyan());
    println!("  {}                      - Show playback state", "state".cyan());
    println!("  {}                       - Stop playback now", "stop".cyan());
    println!("  {}                     - Reload the pedalboard file", "reload".cyan());
    println!();
    println!("{}", "MIDI Commands:".green());
    println!("  {}       - List MIDI output ports", "midi devices".cyan());
    println!("  {} - Connect to MIDI port", "midi connect <port>".cyan());
    println!("  {}    - Disconnect MIDI", "midi disconnect".cyan());
    println!("  {}        - Show MIDI status", "midi status".cyan());
    println!("  {}         - All notes off (panic)", "midi panic".cyan());
    println!();
    println!("{}", "Other Commands:".green());
    println!("  {}              - Show this help", "help".bright_green());
    println!("  {}              - Exit the REPL", "quit".bright_red());
}
