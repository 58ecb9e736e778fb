use std::io::Write;

use pedalboard::pedalboard::{load_configuration, PedalboardFile};
use pedalboard_core::{Action, GeneratorLibrary};

const BOARD: &str = r#"{
    "name": "Sunday set",
    "tempo": 96,
    "time_signature": "3/4",
    "buttons": [
        { "number": 1, "key": 36, "label": "left" },
        { "number": 2, "key": 38 }
    ],
    "controls": [
        { "key": 36, "kind": "play", "pattern": "Waltz", "generator": "HALF_TIME", "length_in_measures": 2 },
        { "key": 38, "kind": "finish", "title": "Wrap up" },
        { "key": 40, "kind": "hit", "options": ["crash", "china"], "velocity": 120 }
    ]
}"#;

#[test]
fn test_load_pedalboard_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BOARD.as_bytes()).unwrap();

    let config = load_configuration(file.path(), &GeneratorLibrary::with_builtins()).unwrap();
    assert_eq!(config.name(), "Sunday set");
    assert_eq!(config.len(), 3);
    assert_eq!(config.label(38), Some("Wrap up"));
    assert!(matches!(config.action(36), Some(Action::Play { .. })));
    assert!(config.patterns().resolve("Waltz").is_ok());

    let layout = PedalboardFile::load(file.path()).unwrap().layout();
    assert_eq!(layout.key_for(1), Some(36));
    assert_eq!(layout.button_for(38).map(|b| b.number), Some(2));
}
