//! Pattern registry: owns pattern bindings and delegates materialization

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::types::{Context, ResolvedContext, Time};

use super::generator::{Generator, Phrase};

/// Role label; grooves and fills share the same structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PatternRole {
    #[default]
    Groove,
    Fill,
}

/// A named, immutable binding of context, length and generator
#[derive(Clone)]
pub struct Pattern {
    name: String,
    role: PatternRole,
    context: Context,
    length_in_measures: u32,
    generator: Arc<dyn Generator>,
}

impl Pattern {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> PatternRole {
        self.role
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn length_in_measures(&self) -> u32 {
        self.length_in_measures
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("length_in_measures", &self.length_in_measures)
            .field("generator", &self.generator.name())
            .finish()
    }
}

/// A phrase together with the context snapshot it was generated against
#[derive(Debug, Clone)]
pub struct Materialized {
    pub phrase: Phrase,
    pub context: ResolvedContext,
}

/// Named patterns in registration order
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
    index: HashMap<String, usize>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern under a fresh name.
    ///
    /// Registered patterns cannot be modified; rebuild the configuration to
    /// change one.
    pub fn register(
        &mut self,
        name: &str,
        role: PatternRole,
        context: Context,
        length_in_measures: u32,
        generator: Arc<dyn Generator>,
    ) -> Result<&Pattern, ConfigurationError> {
        if self.index.contains_key(name) {
            return Err(ConfigurationError::DuplicatePattern {
                name: name.to_string(),
            });
        }
        if length_in_measures == 0 {
            return Err(ConfigurationError::InvalidLength {
                name: name.to_string(),
            });
        }

        let position = self.patterns.len();
        self.patterns.push(Pattern {
            name: name.to_string(),
            role,
            context,
            length_in_measures,
            generator,
        });
        self.index.insert(name.to_string(), position);
        Ok(&self.patterns[position])
    }

    pub fn resolve(&self, name: &str) -> Result<&Pattern, ConfigurationError> {
        self.index
            .get(name)
            .map(|&i| &self.patterns[i])
            .ok_or_else(|| ConfigurationError::UnknownPattern {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Resolve the pattern's context as it stands now and run its generator
    pub fn materialize(&self, name: &str) -> Result<Materialized, ConfigurationError> {
        let pattern = self.resolve(name)?;
        let context = pattern.context.resolve()?;
        let notes = pattern
            .generator
            .generate(&context, pattern.length_in_measures);
        let length = context.time_signature.measure_length()
            * Time::from_integer(pattern.length_in_measures as i64);

        Ok(Materialized {
            phrase: Phrase::new(notes, length),
            context,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::HalfTime;
    use crate::types::{beats, TimeSignature};

    fn base() -> Context {
        Context::base(120, TimeSignature::COMMON).unwrap()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = PatternRegistry::new();
        registry
            .register("Verse", PatternRole::Groove, base(), 4, Arc::new(HalfTime))
            .unwrap();

        let pattern = registry.resolve("Verse").unwrap();
        assert_eq!(pattern.length_in_measures(), 4);
        assert_eq!(pattern.generator_name(), "HALF_TIME");
        assert_eq!(pattern.role(), PatternRole::Groove);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = PatternRegistry::new();
        registry
            .register("Verse", PatternRole::Groove, base(), 4, Arc::new(HalfTime))
            .unwrap();
        let err = registry
            .register("Verse", PatternRole::Fill, base(), 1, Arc::new(HalfTime))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicatePattern {
                name: "Verse".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("Verse").unwrap().role(), PatternRole::Groove);
    }

    #[test]
    fn test_unknown_pattern() {
        let registry = PatternRegistry::new();
        assert!(matches!(
            registry.resolve("Nope"),
            Err(ConfigurationError::UnknownPattern { .. })
        ));
        assert!(registry.materialize("Nope").is_err());
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut registry = PatternRegistry::new();
        let err = registry
            .register("Empty", PatternRole::Fill, base(), 0, Arc::new(HalfTime))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidLength { .. }));
    }

    #[test]
    fn test_materialize_reads_context_at_call_time() {
        let session = base();
        let mut registry = PatternRegistry::new();
        registry
            .register(
                "Verse",
                PatternRole::Groove,
                Context::derive(&session),
                2,
                Arc::new(HalfTime),
            )
            .unwrap();

        let first = registry.materialize("Verse").unwrap();
        assert_eq!(first.context.tempo, 120);
        assert_eq!(first.phrase.length(), beats(8));

        session.set_tempo(90).unwrap();
        session
            .set_time_signature(TimeSignature::new(3, 4).unwrap())
            .unwrap();
        let second = registry.materialize("Verse").unwrap();
        assert_eq!(second.context.tempo, 90);
        assert_eq!(second.phrase.length(), beats(6));
    }

    #[test]
    fn test_names_keep_registration_order() {
        let mut registry = PatternRegistry::new();
        for name in ["Intro", "Verse", "Chorus"] {
            registry
                .register(name, PatternRole::Groove, base(), 1, Arc::new(HalfTime))
                .unwrap();
        }
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Intro", "Verse", "Chorus"]);
    }
}
