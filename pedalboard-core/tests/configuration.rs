use std::sync::Arc;

use pedalboard_core::types::beats;
use pedalboard_core::{
    Action, Configuration, ConfigurationError, Context, Control, DrumPiece, Generator,
    GeneratorLibrary, Pitch, ResolvedContext, SwitchMode, TimeSignature, TimedNote,
};

struct Click;

impl Generator for Click {
    fn name(&self) -> &str {
        "CLICK"
    }

    fn generate(&self, context: &ResolvedContext, length_in_measures: u32) -> Vec<TimedNote> {
        let beat = context.time_signature.beat_length();
        let count = context.time_signature.beats_per_measure as u32 * length_in_measures;
        (0..count)
            .map(|i| {
                TimedNote::new(
                    beat * beats(i as i64),
                    beat,
                    DrumPiece::SideStick.pitch(),
                    90,
                )
            })
            .collect()
    }
}

fn library() -> GeneratorLibrary {
    GeneratorLibrary::with_builtins()
}

#[test]
fn duplicate_trigger_key_fails_the_whole_build() {
    let result = Configuration::build(
        "Duplicates",
        120,
        TimeSignature::COMMON,
        &[
            Control::play(3, "Verse", "HALF_TIME", 4),
            Control::stop(3),
            Control::noop(4),
        ],
        &library(),
    );

    let errors = result.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors.errors()[0],
        ConfigurationError::DuplicateTrigger { key: 3, .. }
    ));
    assert!(errors.to_string().contains("trigger key 3"));
}

#[test]
fn half_time_play_control_compiles() {
    let config = Configuration::build(
        "Practice",
        120,
        TimeSignature::COMMON,
        &[Control::play(60, "Groove", "HALF_TIME", 4)],
        &library(),
    )
    .unwrap();

    let pattern = config.patterns().resolve("Groove").unwrap();
    assert_eq!(pattern.generator_name(), "HALF_TIME");
    assert_eq!(pattern.length_in_measures(), 4);

    let materialized = config.patterns().materialize("Groove").unwrap();
    assert_eq!(materialized.context.tempo, 120);
    assert_eq!(materialized.phrase.length(), beats(16));
    assert!(!materialized.phrase.is_empty());
    assert!(matches!(config.action(60), Some(Action::Play { .. })));
}

#[test]
fn every_key_maps_to_at_most_one_action() {
    let controls: Vec<Control> = (0..=127u8)
        .map(|key| match key % 3 {
            0 => Control::stop(key),
            1 => Control::finish(key),
            _ => Control::hit(key, vec![DrumPiece::Kick], 100),
        })
        .collect();

    let config = Configuration::build(
        "Full",
        100,
        TimeSignature::COMMON,
        &controls,
        &library(),
    )
    .unwrap();

    assert_eq!(config.len(), 128);
    let keys: Vec<u8> = config.bindings().iter().map(|b| b.key).collect();
    let expected: Vec<u8> = (0..=127).collect();
    assert_eq!(keys, expected);
}

#[test]
fn composable_context_reads_through_live() {
    let base = Context::base(90, TimeSignature::COMMON).unwrap();
    let child = Context::composable(Some(&base), None, None).unwrap();
    assert_eq!(child.tempo(), Ok(90));

    base.set_tempo(100).unwrap();
    assert_eq!(child.tempo(), Ok(100));
}

#[test]
fn live_base_edits_reach_materialized_patterns() {
    let config = Configuration::build(
        "Live",
        90,
        TimeSignature::COMMON,
        &[Control::play(60, "Verse", "HALF_TIME", 1)],
        &library(),
    )
    .unwrap();

    assert_eq!(config.patterns().materialize("Verse").unwrap().context.tempo, 90);
    config.context().set_tempo(100).unwrap();
    assert_eq!(config.patterns().materialize("Verse").unwrap().context.tempo, 100);
}

#[test]
fn custom_generators_are_injected() {
    let mut library = library();
    library.register(Arc::new(Click));

    let config = Configuration::build(
        "Click",
        60,
        TimeSignature::new(3, 4).unwrap(),
        &[
            Control::play(60, "Click", "click", 2).immediate(),
            Control::play_existing(61, "Click"),
        ],
        &library,
    )
    .unwrap();

    let phrase = config.patterns().materialize("Click").unwrap().phrase;
    assert_eq!(phrase.len(), 6);
    assert!(phrase
        .iter()
        .all(|n| n.pitch == Pitch::of(DrumPiece::SideStick.midi_note())));
    assert_eq!(
        config.action(60),
        Some(&Action::Play {
            pattern: "Click".to_string(),
            switch_mode: SwitchMode::Immediate
        })
    );
}
