//! Minimal stderr logger behind the `log` facade
//!
//! The level comes from `PEDALBOARD_LOG` (`error`, `warn`, `info`, `debug`
//! or `trace`), defaulting to `warn` so the prompt stays quiet.

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::str::FromStr;

pub const LOG_ENV: &str = "PEDALBOARD_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR".bright_red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".green(),
            Level::Debug => "DEBUG".blue(),
            Level::Trace => "TRACE".dimmed(),
        };
        eprintln!(
            "{} {} {}",
            level,
            record.target().dimmed(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Parse a level name, falling back to `warn` for anything unrecognised
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Install the logger; `verbose` raises the floor to `debug`
pub fn init(verbose: bool) {
    let mut level = level_from(std::env::var(LOG_ENV).ok().as_deref());
    if verbose && level < LevelFilter::Debug {
        level = LevelFilter::Debug;
    }
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}
