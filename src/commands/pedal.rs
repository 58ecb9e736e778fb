//! Pedal commands: press buttons, inspect bindings, reload

use std::sync::Arc;

use colored::*;
use pedalboard_core::Pitch;

use crate::commands::{CommandContext, CommandResult};
use crate::pedalboard::load_configuration;

/// Split `<target> [velocity]`
fn parse_target(args: &str, usage: &str) -> Result<(String, Option<u8>), String> {
    let mut parts = args.split_whitespace();
    let target = parts.next().ok_or_else(|| usage.to_string())?;
    let velocity = match parts.next() {
        Some(v) => match v.parse::<u8>() {
            Ok(v) if (1..=127).contains(&v) => Some(v),
            _ => return Err(format!("Invalid velocity '{}': use 1-127", v)),
        },
        None => None,
    };
    if parts.next().is_some() {
        return Err(usage.to_string());
    }
    Ok((target.to_string(), velocity))
}

fn describe(ctx: &CommandContext, key: u8) -> String {
    let config = ctx.handle.configuration();
    match config.label(key) {
        Some(label) => label.to_string(),
        None => "unbound".dimmed().to_string(),
    }
}

/// Handle `press <button> [velocity]`
pub fn cmd_press(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let (button, velocity) = match parse_target(args, "Usage: press <button> [velocity]") {
        Ok(parsed) => parsed,
        Err(e) => return CommandResult::Error(e),
    };
    let number = match button.parse::<u8>() {
        Ok(n) => n,
        Err(_) => return CommandResult::Error(format!("'{}' is not a button number", button)),
    };
    let Some(key) = ctx.layout.key_for(number) else {
        return CommandResult::Error(format!("No button {} on this pedalboard", number));
    };

    ctx.handle.press(key, velocity);
    CommandResult::Message(format!(
        "{} button {} (key {}): {}",
        "▶".bright_green(),
        number,
        key,
        describe(ctx, key)
    ))
}

/// Handle `key <note> [velocity]`; the note is a number or a name like `C4`
pub fn cmd_key(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let (note, velocity) = match parse_target(args, "Usage: key <note> [velocity]") {
        Ok(parsed) => parsed,
        Err(e) => return CommandResult::Error(e),
    };
    let pitch: Pitch = match note.parse() {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(format!("{}", e)),
    };

    ctx.handle.press(pitch.midi(), velocity);
    CommandResult::Message(format!(
        "{} key {} ({}): {}",
        "▶".bright_green(),
        pitch.midi(),
        pitch,
        describe(ctx, pitch.midi())
    ))
}

/// Handle `buttons`: physical buttons first, then keys only reachable via `key`
pub fn cmd_buttons(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let config = ctx.handle.configuration();
    let mut output = format!(
        "{} {} ({} bindings)\n",
        "Pedalboard".bold(),
        config.name().bright_cyan(),
        config.len()
    );

    for button in ctx.layout.iter() {
        let name = button
            .label
            .as_deref()
            .map(|l| format!(" [{}]", l))
            .unwrap_or_default();
        output.push_str(&format!(
            "  {}{} key {:<3} {}\n",
            format!("{}.", button.number).bright_yellow(),
            name,
            button.key,
            describe(ctx, button.key)
        ));
    }

    let extra: Vec<_> = config
        .bindings()
        .into_iter()
        .filter(|b| ctx.layout.button_for(b.key).is_none())
        .collect();
    if !extra.is_empty() {
        output.push_str(&format!("{}\n", "Other keys:".dimmed()));
        for binding in extra {
            output.push_str(&format!("  key {:<3} {}\n", binding.key, binding.label));
        }
    }

    CommandResult::Message(output.trim_end().to_string())
}

/// Handle `state`
pub fn cmd_state(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(format!("State: {}", ctx.handle.state().to_string().bright_cyan()))
}

/// Handle `stop`
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.handle.stop();
    CommandResult::Message("■ Stopped".yellow().to_string())
}

/// Handle `reload`: rebuild from the pedalboard file, keep the current
/// configuration if the file has errors
pub fn cmd_reload(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some(path) = ctx.source.clone() else {
        return CommandResult::Error("No pedalboard file to reload".to_string());
    };
    match load_configuration(&path, &ctx.generators) {
        Ok(config) => {
            let message = format!(
                "🔄 Reloaded '{}' ({} bindings)",
                config.name(),
                config.len()
            );
            ctx.handle.reload(Arc::new(config));
            CommandResult::Message(message.green().to_string())
        }
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_context;
    use pedalboard_core::Control;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("3", "usage"), Ok(("3".to_string(), None)));
        assert_eq!(parse_target("C4 90", "usage"), Ok(("C4".to_string(), Some(90))));
        assert!(parse_target("", "usage").is_err());
        assert!(parse_target("3 0", "usage").is_err());
        assert!(parse_target("3 90 1", "usage").is_err());
    }

    #[test]
    fn test_press_rejects_unknown_button() {
        let (mut ctx, _) = test_context(&[]);
        assert!(matches!(cmd_press("9", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_press("one", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_key_accepts_note_names() {
        colored::control::set_override(false);
        let (mut ctx, recorder) = test_context(&[Control::stop(60)]);
        let result = cmd_key("C4", &mut ctx);
        assert_eq!(
            result,
            CommandResult::Message("▶ key 60 (C4): Stop now!".to_string())
        );

        // Press is asynchronous; wait for the dispatcher thread
        for _ in 0..100 {
            if recorder.len() == 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_buttons_lists_layout_and_extra_keys() {
        colored::control::set_override(false);
        let (mut ctx, _) = test_context(&[Control::stop(60), Control::noop(100)]);
        let CommandResult::Message(text) = cmd_buttons("", &mut ctx) else {
            panic!("expected a message");
        };
        assert!(text.contains("1. key 60  Stop now!"));
        assert!(text.contains("key 100 Does nothing"));
    }

    #[test]
    fn test_reload_without_source() {
        let (mut ctx, _) = test_context(&[]);
        assert!(matches!(cmd_reload("", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_reload_swaps_configuration() {
        let (ctx, _) = test_context(&[Control::stop(60)]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "name": "Fresh", "controls": [{{ "key": 61, "kind": "finish" }}] }}"#
        )
        .unwrap();
        let mut ctx = ctx.with_source(file.path().to_path_buf());

        assert!(matches!(cmd_reload("", &mut ctx), CommandResult::Message(_)));
        let mut name = String::new();
        for _ in 0..100 {
            name = ctx.handle.configuration().name().to_string();
            if name == "Fresh" {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(name, "Fresh");
    }
}
