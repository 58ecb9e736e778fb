use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::*;
use log::{info, warn};

use pedalboard::clock::{MonotonicTime, TickClock, TimeSource, DEFAULT_RESOLUTION};
use pedalboard::commands::CommandContext;
use pedalboard::dispatch::{DispatcherHandle, LiveDispatcher, PressSettings};
use pedalboard::logger;
use pedalboard::pedalboard::{ConfigWatcher, PedalboardFile};
use pedalboard::processor::{ConsoleProcessor, MidiProcessor, Processor};
use pedalboard::repl::Repl;
use pedalboard_core::{Channel, ConfigurationErrors, GeneratorLibrary};

/// Trigger live drum accompaniment from a MIDI foot pedal
#[derive(Parser, Debug)]
#[command(name = "pedalboard", version, about)]
struct Args {
    /// Pedalboard file (JSON) describing the buttons and their actions
    file: PathBuf,

    /// MIDI output port to connect to (partial names match)
    #[arg(short = 'p', long)]
    midi_port: Option<String>,

    /// MIDI channel for press signals (1-16)
    #[arg(short, long, default_value_t = 1)]
    channel: u8,

    /// Velocity used by the `press` and `key` commands
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=127))]
    velocity: u8,

    /// Print signals to the console instead of sending MIDI
    #[arg(long)]
    dry_run: bool,

    /// Reload the configuration whenever the file changes
    #[arg(short, long)]
    watch: bool,

    /// Log at debug level (overrides a quieter PEDALBOARD_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(errors) = e.downcast_ref::<ConfigurationErrors>() {
                eprintln!("{} {}", "Error:".bright_red().bold(), errors);
            } else {
                eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let generators = GeneratorLibrary::with_builtins();
    let file = PedalboardFile::load(&args.file)?;
    let configuration = file.build(&generators).map_err(anyhow::Error::new)?;
    info!(
        "loaded '{}' with {} bindings",
        configuration.name(),
        configuration.len()
    );

    let settings = PressSettings {
        channel: Channel::new(args.channel).context("invalid --channel")?,
        velocity: args.velocity,
    };

    let time: Arc<dyn TimeSource> = Arc::new(MonotonicTime::new());
    let clock = TickClock::new(Arc::clone(&time), DEFAULT_RESOLUTION);

    let midi = if args.dry_run {
        None
    } else {
        let midi = Arc::new(MidiProcessor::new(Arc::clone(&time)));
        if let Some(port) = &args.midi_port {
            let name = midi.connect(port)?;
            println!("🎹 Connected to MIDI port: {}", name.green());
        } else {
            warn!("no MIDI port given, use 'midi connect <port>' to start sending");
        }
        Some(midi)
    };
    let processor: Arc<dyn Processor> = match &midi {
        Some(midi) => Arc::clone(midi) as Arc<dyn Processor>,
        None => Arc::new(ConsoleProcessor::new()),
    };

    let dispatcher = LiveDispatcher::with_settings(Arc::new(configuration), processor, settings);
    let handle = DispatcherHandle::spawn(dispatcher, Arc::clone(&time), clock.subscribe());
    clock.start();

    let _watcher = if args.watch {
        Some(ConfigWatcher::spawn(&args.file, generators.clone(), handle.clone())?)
    } else {
        None
    };

    let mut ctx = CommandContext::new(handle.clone(), file.layout(), generators)
        .with_source(args.file.clone());
    if let Some(midi) = midi {
        ctx = ctx.with_midi(midi);
    }

    let result = Repl::new(ctx).and_then(|mut repl| repl.run());

    handle.shutdown();
    clock.stop();
    result
}
