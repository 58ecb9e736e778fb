//! Configuration builder: compiles controls into a pattern registry and an
//! action table.
//!
//! The build runs every check against every control and reports all
//! violations together. A [`Configuration`] only exists if there were none.

use std::collections::{HashMap, HashSet};

use crate::action::{Action, ActionTable};
use crate::control::{Control, ControlCommand};
use crate::error::{ConfigurationError, ConfigurationErrors};
use crate::pattern::{GeneratorLibrary, PatternRegistry, PatternRole};
use crate::types::pitch::MAX_NOTE;
use crate::types::{Context, TimeSignature};

/// A bound trigger key as shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    pub key: u8,
    pub action: &'a Action,
    pub label: &'a str,
}

/// Immutable result of a successful build
#[derive(Debug, Clone)]
pub struct Configuration {
    name: String,
    context: Context,
    patterns: PatternRegistry,
    actions: ActionTable,
    labels: HashMap<u8, String>,
}

impl Configuration {
    /// Compile `controls` against a base context of `tempo` and
    /// `time_signature`.
    ///
    /// Controls that play an existing pattern (no generator) may refer to a
    /// pattern created by a later control.
    pub fn build(
        name: &str,
        tempo: u32,
        time_signature: TimeSignature,
        controls: &[Control],
        generators: &GeneratorLibrary,
    ) -> Result<Configuration, ConfigurationErrors> {
        let mut builder = Builder::new(tempo, time_signature);
        for control in controls {
            builder.add(control, generators);
        }
        builder.finish(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The session's base context; patterns without overrides read through it
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    /// O(1) lookup of the action bound to a trigger key
    pub fn action(&self, key: u8) -> Option<&Action> {
        self.actions.get(key)
    }

    pub fn label(&self, key: u8) -> Option<&str> {
        self.labels.get(&key).map(String::as_str)
    }

    /// Every binding, ascending by key
    pub fn bindings(&self) -> Vec<Binding<'_>> {
        self.actions
            .iter()
            .map(|(key, action)| Binding {
                key,
                action,
                label: self.label(key).unwrap_or_default(),
            })
            .collect()
    }

    /// Number of bound keys
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

struct Builder {
    base: Option<Context>,
    patterns: PatternRegistry,
    actions: ActionTable,
    labels: HashMap<u8, String>,
    /// Patterns some control tried to create, including ones that failed,
    /// so a broken definition is not reported again as a dangling reference
    declared: HashSet<String>,
    references: Vec<String>,
    errors: Vec<ConfigurationError>,
}

impl Builder {
    fn new(tempo: u32, time_signature: TimeSignature) -> Self {
        let mut errors = Vec::new();
        let base = match Context::base(tempo, time_signature) {
            Ok(base) => Some(base),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        Self {
            base,
            patterns: PatternRegistry::new(),
            actions: ActionTable::new(),
            labels: HashMap::new(),
            declared: HashSet::new(),
            references: Vec::new(),
            errors,
        }
    }

    fn add(&mut self, control: &Control, generators: &GeneratorLibrary) {
        let label = control.label();
        let key_ok = self.check_key(control.key, &label);

        let action = match &control.command {
            ControlCommand::Play {
                pattern,
                generator,
                tempo,
                time_signature,
                length_in_measures,
                role,
                switch_mode,
            } => {
                match generator {
                    Some(generator) => self.create_pattern(
                        pattern,
                        generator,
                        *tempo,
                        *time_signature,
                        *length_in_measures,
                        *role,
                        generators,
                    ),
                    None => self.references.push(pattern.clone()),
                }
                Action::Play {
                    pattern: pattern.clone(),
                    switch_mode: *switch_mode,
                }
            }
            ControlCommand::Hit { options, velocity } => {
                if options.is_empty() {
                    self.errors
                        .push(ConfigurationError::EmptyHitOptions { key: control.key });
                }
                if !(1..=127).contains(velocity) {
                    self.errors
                        .push(ConfigurationError::InvalidVelocity(*velocity));
                }
                Action::Hit {
                    options: options.clone(),
                    velocity: *velocity,
                }
            }
            ControlCommand::Finish => Action::Finish,
            ControlCommand::Stop => Action::Stop,
            ControlCommand::NoOp => Action::NoOp,
        };

        if key_ok && self.actions.insert(control.key, action).is_ok() {
            self.labels.insert(control.key, label);
        }
    }

    fn check_key(&mut self, key: u8, label: &str) -> bool {
        if key > MAX_NOTE {
            self.errors.push(ConfigurationError::InvalidTrigger { key });
            return false;
        }
        if let Some(existing) = self.labels.get(&key) {
            self.errors.push(ConfigurationError::DuplicateTrigger {
                key,
                existing: existing.clone(),
                duplicate: label.to_string(),
            });
            return false;
        }
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn create_pattern(
        &mut self,
        name: &str,
        generator_name: &str,
        tempo: Option<u32>,
        time_signature: Option<TimeSignature>,
        length_in_measures: u32,
        role: PatternRole,
        generators: &GeneratorLibrary,
    ) {
        let first_declaration = self.declared.insert(name.to_string());

        let generator = generators.get(generator_name);
        if generator.is_none() {
            self.errors.push(ConfigurationError::UnknownGenerator {
                generator: generator_name.to_string(),
                pattern: name.to_string(),
            });
        }

        let context = match Context::composable(self.base.as_ref(), tempo, time_signature) {
            Ok(context) => Some(context),
            Err(e) => {
                self.errors.push(e);
                None
            }
        };

        if !first_declaration {
            self.errors.push(ConfigurationError::DuplicatePattern {
                name: name.to_string(),
            });
            return;
        }

        // Without a valid base the registry is never exposed, so skip it
        if self.base.is_none() {
            return;
        }
        if let (Some(generator), Some(context)) = (generator, context) {
            if let Err(e) = context.validate() {
                self.errors.push(e);
                return;
            }
            if let Err(e) =
                self.patterns
                    .register(name, role, context, length_in_measures, generator)
            {
                self.errors.push(e);
            }
        } else if length_in_measures == 0 {
            self.errors.push(ConfigurationError::InvalidLength {
                name: name.to_string(),
            });
        }
    }

    fn finish(mut self, name: &str) -> Result<Configuration, ConfigurationErrors> {
        for pattern in std::mem::take(&mut self.references) {
            if !self.declared.contains(&pattern) {
                self.errors
                    .push(ConfigurationError::UnknownPattern { name: pattern });
            }
        }

        match self.base {
            Some(context) if self.errors.is_empty() => Ok(Configuration {
                name: name.to_string(),
                context,
                patterns: self.patterns,
                actions: self.actions,
                labels: self.labels,
            }),
            _ => Err(ConfigurationErrors::new(name, self.errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::SwitchMode;
    use crate::types::DrumPiece;

    fn library() -> GeneratorLibrary {
        GeneratorLibrary::with_builtins()
    }

    fn build(controls: &[Control]) -> Result<Configuration, ConfigurationErrors> {
        Configuration::build("Test", 120, TimeSignature::COMMON, controls, &library())
    }

    #[test]
    fn test_build_simple() {
        let config = build(&[
            Control::play(60, "Verse", "HALF_TIME", 4),
            Control::hit(61, vec![DrumPiece::Crash], 110),
            Control::finish(62),
            Control::stop(63),
            Control::noop(64),
        ])
        .unwrap();

        assert_eq!(config.name(), "Test");
        assert_eq!(config.len(), 5);
        assert_eq!(config.patterns().len(), 1);
        assert_eq!(
            config.action(60),
            Some(&Action::Play {
                pattern: "Verse".to_string(),
                switch_mode: SwitchMode::AtBoundary
            })
        );
        assert_eq!(config.action(65), None);
        assert_eq!(config.label(63), Some("Stop now!"));
    }

    #[test]
    fn test_bindings_in_key_order() {
        let config = build(&[Control::stop(64), Control::noop(3), Control::finish(20)]).unwrap();
        let keys: Vec<u8> = config.bindings().iter().map(|b| b.key).collect();
        assert_eq!(keys, vec![3, 20, 64]);
        assert_eq!(config.bindings()[0].label, "Does nothing");
    }

    #[test]
    fn test_duplicate_trigger() {
        let errors = build(&[
            Control::stop(3).with_title("First"),
            Control::noop(3).with_title("Second"),
        ])
        .unwrap_err();

        assert_eq!(
            errors.errors(),
            &[ConfigurationError::DuplicateTrigger {
                key: 3,
                existing: "First".to_string(),
                duplicate: "Second".to_string(),
            }]
        );
    }

    #[test]
    fn test_reports_every_violation() {
        let errors = build(&[
            Control::play(60, "Verse", "SAMBA", 4),
            Control::play(61, "Verse", "HALF_TIME", 4),
            Control::play_existing(62, "Chorus"),
            Control::hit(63, vec![], 0),
            Control::stop(200),
        ])
        .unwrap_err();

        assert_eq!(errors.len(), 6);
        assert!(errors.contains(|e| matches!(e, ConfigurationError::UnknownGenerator { generator, .. } if generator == "SAMBA")));
        assert!(errors.contains(|e| matches!(e, ConfigurationError::DuplicatePattern { name } if name == "Verse")));
        assert!(errors.contains(|e| matches!(e, ConfigurationError::UnknownPattern { name } if name == "Chorus")));
        assert!(errors.contains(|e| matches!(e, ConfigurationError::EmptyHitOptions { key: 63 })));
        assert!(errors.contains(|e| matches!(e, ConfigurationError::InvalidVelocity(0))));
        assert!(errors.contains(|e| matches!(e, ConfigurationError::InvalidTrigger { key: 200 })));
    }

    #[test]
    fn test_reference_order_does_not_matter() {
        let config = build(&[
            Control::play_existing(61, "Verse").immediate(),
            Control::play(60, "Verse", "half-time", 2),
        ])
        .unwrap();
        assert_eq!(config.patterns().len(), 1);
        assert_eq!(
            config.action(61),
            Some(&Action::Play {
                pattern: "Verse".to_string(),
                switch_mode: SwitchMode::Immediate
            })
        );
    }

    #[test]
    fn test_invalid_base_and_overrides() {
        let errors = Configuration::build(
            "Broken",
            0,
            TimeSignature::COMMON,
            &[Control::play(60, "Fast", "BLAST_BEAT", 1).with_tempo(500)],
            &library(),
        )
        .unwrap_err();

        assert_eq!(errors.configuration(), "Broken");
        assert_eq!(
            errors.errors(),
            &[
                ConfigurationError::InvalidTempo(0),
                ConfigurationError::InvalidTempo(500)
            ]
        );
    }

    #[test]
    fn test_zero_length_pattern() {
        let errors = build(&[Control::play(60, "Empty", "HALF_TIME", 0)]).unwrap_err();
        assert_eq!(
            errors.errors(),
            &[ConfigurationError::InvalidLength {
                name: "Empty".to_string()
            }]
        );
    }

    #[test]
    fn test_patterns_inherit_base() {
        let config = build(&[
            Control::play(60, "Verse", "HALF_TIME", 4),
            Control::play(61, "Bridge", "HALF_TIME", 4).with_tempo(90),
        ])
        .unwrap();

        config.context().set_tempo(140).unwrap();
        let verse = config.patterns().resolve("Verse").unwrap();
        let bridge = config.patterns().resolve("Bridge").unwrap();
        assert_eq!(verse.context().tempo(), Ok(140));
        assert_eq!(bridge.context().tempo(), Ok(90));
    }
}
