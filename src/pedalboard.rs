//! Pedalboard description files and hot reload
//!
//! A pedalboard file is JSON:
//!
//! ```json
//! {
//!   "name": "Practice",
//!   "tempo": 120,
//!   "time_signature": "4/4",
//!   "buttons": [{ "number": 1, "key": 60, "label": "Left" }],
//!   "controls": [
//!     { "key": 60, "kind": "play", "pattern": "Verse", "generator": "HALF_TIME", "length_in_measures": 4 },
//!     { "key": 61, "kind": "stop" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use log::{error, info};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pedalboard_core::{
    Configuration, ConfigurationErrors, Control, GeneratorLibrary, TimeSignature,
};
use serde::{Deserialize, Serialize};

use crate::dispatch::DispatcherHandle;

/// Editors often write a file in several steps; wait this long for quiet
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(150);

fn default_tempo() -> u32 {
    120
}

/// A physical button and the trigger key it sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub number: u8,
    pub key: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Physical button numbers mapped to trigger keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonLayout {
    buttons: Vec<ButtonSpec>,
}

impl ButtonLayout {
    pub fn new(mut buttons: Vec<ButtonSpec>) -> Self {
        buttons.sort_by_key(|b| b.number);
        Self { buttons }
    }

    /// Five buttons numbered 1-5 sending keys 60-64
    pub fn five_button() -> Self {
        Self::new(
            (1..=5u8)
                .map(|number| ButtonSpec {
                    number,
                    key: 59 + number,
                    label: None,
                })
                .collect(),
        )
    }

    pub fn key_for(&self, number: u8) -> Option<u8> {
        self.buttons
            .iter()
            .find(|b| b.number == number)
            .map(|b| b.key)
    }

    pub fn button_for(&self, key: u8) -> Option<&ButtonSpec> {
        self.buttons.iter().find(|b| b.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ButtonSpec> {
        self.buttons.iter()
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}

impl Default for ButtonLayout {
    fn default() -> Self {
        Self::five_button()
    }
}

/// On-disk pedalboard description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedalboardFile {
    pub name: String,
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    #[serde(default)]
    pub time_signature: TimeSignature,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ButtonSpec>,
    #[serde(default)]
    pub controls: Vec<Control>,
}

impl PedalboardFile {
    pub fn parse(source: &str) -> Result<Self> {
        serde_json::from_str(source).context("invalid pedalboard description")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Compile the controls into a configuration
    pub fn build(&self, generators: &GeneratorLibrary) -> Result<Configuration, ConfigurationErrors> {
        Configuration::build(
            &self.name,
            self.tempo,
            self.time_signature,
            &self.controls,
            generators,
        )
    }

    /// Declared buttons, or the five-button default when none are listed
    pub fn layout(&self) -> ButtonLayout {
        if self.buttons.is_empty() {
            ButtonLayout::default()
        } else {
            ButtonLayout::new(self.buttons.clone())
        }
    }
}

/// Load and build in one step; build violations become the error
pub fn load_configuration(path: &Path, generators: &GeneratorLibrary) -> Result<Configuration> {
    let file = PedalboardFile::load(path)?;
    file.build(generators).map_err(anyhow::Error::new)
}

/// Watches a pedalboard file and hands every successfully rebuilt
/// configuration to the dispatcher.
///
/// A file that fails to build is reported and the live configuration is
/// kept.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    _thread: JoinHandle<()>,
}

impl ConfigWatcher {
    pub fn spawn(
        path: &Path,
        generators: GeneratorLibrary,
        target: DispatcherHandle,
    ) -> Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot watch {}", path.display()))?;
        // Watch the directory: editors often replace the file rather than
        // write it in place
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;

        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the watcher is shutting down
            let _ = tx.send(res);
        })?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        let thread = thread::spawn(move || Self::run(path, generators, target, rx));

        Ok(Self {
            _watcher: watcher,
            _thread: thread,
        })
    }

    fn run(
        path: PathBuf,
        generators: GeneratorLibrary,
        target: DispatcherHandle,
        rx: Receiver<notify::Result<Event>>,
    ) {
        while let Ok(event) = rx.recv() {
            if !Self::touches(&event, &path) {
                continue;
            }
            // Swallow the rest of the burst
            loop {
                match rx.recv_timeout(RELOAD_DEBOUNCE) {
                    Ok(_) => continue,
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            Self::reload(&path, &generators, &target);
        }
    }

    fn touches(event: &notify::Result<Event>, path: &Path) -> bool {
        match event {
            Ok(event) => {
                matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                    && event.paths.iter().any(|p| p == path)
            }
            Err(e) => {
                error!("watch error: {}", e);
                false
            }
        }
    }

    fn reload(path: &Path, generators: &GeneratorLibrary, target: &DispatcherHandle) {
        match load_configuration(path, generators) {
            Ok(configuration) => {
                info!(
                    "reloaded '{}' from {}",
                    configuration.name(),
                    path.display()
                );
                target.reload(Arc::new(configuration));
            }
            Err(e) => error!("keeping the current configuration: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalboard_core::Action;
    use std::io::Write;

    const PRACTICE: &str = r#"{
        "name": "Practice",
        "tempo": 100,
        "time_signature": "3/4",
        "controls": [
            { "key": 60, "kind": "play", "pattern": "Verse", "generator": "HALF_TIME", "length_in_measures": 4 },
            { "key": 61, "kind": "play", "pattern": "Verse", "switch_mode": "immediate" },
            { "key": 62, "kind": "hit", "options": ["crash", "china"] },
            { "key": 63, "kind": "finish" },
            { "key": 64, "kind": "stop", "title": "Panic" }
        ]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let file = PedalboardFile::parse(PRACTICE).unwrap();
        assert_eq!(file.tempo, 100);
        assert_eq!(file.time_signature, TimeSignature::new(3, 4).unwrap());
        assert_eq!(file.layout(), ButtonLayout::five_button());

        let config = file.build(&GeneratorLibrary::with_builtins()).unwrap();
        assert_eq!(config.name(), "Practice");
        assert_eq!(config.len(), 5);
        assert_eq!(config.label(64), Some("Panic"));
        assert!(matches!(config.action(62), Some(Action::Hit { velocity: 100, .. })));
    }

    #[test]
    fn test_default_layout() {
        let layout = ButtonLayout::default();
        assert_eq!(layout.len(), 5);
        assert_eq!(layout.key_for(1), Some(60));
        assert_eq!(layout.key_for(5), Some(64));
        assert_eq!(layout.key_for(6), None);
        assert_eq!(layout.button_for(62).map(|b| b.number), Some(3));
    }

    #[test]
    fn test_declared_buttons() {
        let file = PedalboardFile::parse(
            r#"{ "name": "Two", "buttons": [{ "number": 2, "key": 40 }, { "number": 1, "key": 36, "label": "Kick" }] }"#,
        )
        .unwrap();
        let layout = file.layout();
        let numbers: Vec<u8> = layout.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(layout.key_for(2), Some(40));
        assert_eq!(file.tempo, 120);
    }

    #[test]
    fn test_load_reports_every_violation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "name": "Broken", "controls": [
                {{ "key": 3, "kind": "stop" }},
                {{ "key": 3, "kind": "finish" }},
                {{ "key": 4, "kind": "play", "pattern": "Nope" }}
            ] }}"#
        )
        .unwrap();

        let err = load_configuration(file.path(), &GeneratorLibrary::with_builtins()).unwrap_err();
        let errors = err.downcast_ref::<ConfigurationErrors>().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(err.to_string().contains("'Broken' has 2 error(s)"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PedalboardFile::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
    }
}
