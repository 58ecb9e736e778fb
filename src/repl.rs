//! Interactive console for driving the pedalboard from the keyboard
//!
//! Input is read on its own thread so that state changes coming from the
//! dispatcher (deferred transitions firing, finishes completing) can be
//! printed while the prompt is idle.

use crate::commands::{create_registry, CommandContext, CommandResult};
use crate::dispatch::StateChange;
use anyhow::Result;
use colored::*;
use crossbeam_channel::{unbounded, Receiver};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::thread;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// Interactive REPL over a running dispatcher
pub struct Repl {
    editor: Option<DefaultEditor>,
    ctx: CommandContext,
    changes: Receiver<StateChange>,
}

impl Repl {
    pub fn new(ctx: CommandContext) -> Result<Self> {
        let editor = DefaultEditor::new()?;
        let changes = ctx.handle.subscribe();
        Ok(Repl {
            editor: Some(editor),
            ctx,
            changes,
        })
    }

    fn print_banner(&self) {
        let config = self.ctx.handle.configuration();
        println!(
            "{} {} {}",
            "🦶".bright_yellow(),
            "Pedalboard".bright_cyan().bold(),
            format!("· {}", config.name()).dimmed()
        );
        println!(
            "Try {}, {} or {}",
            "press 1".cyan(),
            "buttons".cyan(),
            "stop".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+D".bright_red()
        );
    }

    /// Run until `quit`, end of input, or the dispatcher goes away
    pub fn run(&mut self) -> Result<()> {
        self.print_banner();

        let Some(mut editor) = self.editor.take() else {
            anyhow::bail!("REPL is already running");
        };
        let (tx_input, rx_input) = unbounded();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "pedalboard>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        let registry = create_registry();

        loop {
            crossbeam_channel::select! {
                recv(rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if line.is_empty() {
                            continue;
                        }
                        match registry.execute(&line, &mut self.ctx) {
                            CommandResult::Success => {}
                            CommandResult::Message(msg) => println!("{}", msg),
                            CommandResult::Exit => {
                                println!("{} 🦶", "Goodbye!".bright_cyan());
                                break;
                            }
                            CommandResult::NotACommand => println!(
                                "{} unknown command '{}', try {}",
                                "Error:".bright_red().bold(),
                                line,
                                "help".bright_green()
                            ),
                            CommandResult::Error(e) => {
                                println!("{} {}", "Error:".bright_red().bold(), e.red())
                            }
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted))) => {
                        println!("^C");
                        break;
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{} 🦶", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!("{} {:?}", "Error:".red(), err);
                        break;
                    }
                    Err(_) => break,
                },
                recv(self.changes) -> msg => match msg {
                    Ok(change) => println!(
                        "{} {} → {} {}",
                        "⟳".bright_blue(),
                        change.from.to_string().dimmed(),
                        change.to.to_string().bright_cyan(),
                        format!("@{}", change.at).dimmed()
                    ),
                    Err(_) => {
                        println!("{}", "Dispatcher stopped".red());
                        break;
                    }
                },
            }
        }

        self.ctx.handle.stop();
        Ok(())
    }
}
