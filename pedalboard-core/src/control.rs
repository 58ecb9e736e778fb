//! Declarative pedal control specifications, as produced by an editor

use crate::action::SwitchMode;
use crate::pattern::PatternRole;
use crate::types::{DrumPiece, TimeSignature};

#[cfg(feature = "serde")]
fn default_length() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn default_velocity() -> u8 {
    100
}

/// What a control does when its trigger key is pressed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ControlCommand {
    /// Play a pattern. With a generator the build creates the pattern; without
    /// one the control refers to a pattern created by another control.
    Play {
        pattern: String,
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        generator: Option<String>,
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        tempo: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        time_signature: Option<TimeSignature>,
        #[cfg_attr(feature = "serde", serde(default = "default_length"))]
        length_in_measures: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        role: PatternRole,
        #[cfg_attr(feature = "serde", serde(default))]
        switch_mode: SwitchMode,
    },
    Hit {
        options: Vec<DrumPiece>,
        #[cfg_attr(feature = "serde", serde(default = "default_velocity"))]
        velocity: u8,
    },
    Finish,
    Stop,
    #[cfg_attr(feature = "serde", serde(alias = "noop"))]
    NoOp,
}

/// One pedal: a trigger key, an optional title and a command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Control {
    pub key: u8,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub command: ControlCommand,
}

impl Control {
    pub fn new(key: u8, command: ControlCommand) -> Self {
        Self {
            key,
            title: None,
            command,
        }
    }

    /// Create a pattern from `generator` and play it, switching at the next
    /// measure boundary
    pub fn play(key: u8, pattern: &str, generator: &str, length_in_measures: u32) -> Self {
        Self::new(
            key,
            ControlCommand::Play {
                pattern: pattern.to_string(),
                generator: Some(generator.to_string()),
                tempo: None,
                time_signature: None,
                length_in_measures,
                role: PatternRole::Groove,
                switch_mode: SwitchMode::AtBoundary,
            },
        )
    }

    /// Play a pattern created by another control
    pub fn play_existing(key: u8, pattern: &str) -> Self {
        Self::new(
            key,
            ControlCommand::Play {
                pattern: pattern.to_string(),
                generator: None,
                tempo: None,
                time_signature: None,
                length_in_measures: 1,
                role: PatternRole::Groove,
                switch_mode: SwitchMode::AtBoundary,
            },
        )
    }

    pub fn hit(key: u8, options: Vec<DrumPiece>, velocity: u8) -> Self {
        Self::new(key, ControlCommand::Hit { options, velocity })
    }

    pub fn finish(key: u8) -> Self {
        Self::new(key, ControlCommand::Finish)
    }

    pub fn stop(key: u8) -> Self {
        Self::new(key, ControlCommand::Stop)
    }

    pub fn noop(key: u8) -> Self {
        Self::new(key, ControlCommand::NoOp)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Switch immediately instead of at the boundary (Play only)
    pub fn immediate(self) -> Self {
        self.with_switch_mode(SwitchMode::Immediate)
    }

    pub fn with_switch_mode(mut self, mode: SwitchMode) -> Self {
        if let ControlCommand::Play { switch_mode, .. } = &mut self.command {
            *switch_mode = mode;
        }
        self
    }

    /// Override the session tempo for the pattern this control creates
    pub fn with_tempo(mut self, bpm: u32) -> Self {
        if let ControlCommand::Play { tempo, .. } = &mut self.command {
            *tempo = Some(bpm);
        }
        self
    }

    /// Override the session meter for the pattern this control creates
    pub fn with_time_signature(mut self, signature: TimeSignature) -> Self {
        if let ControlCommand::Play { time_signature, .. } = &mut self.command {
            *time_signature = Some(signature);
        }
        self
    }

    pub fn with_role(mut self, new_role: PatternRole) -> Self {
        if let ControlCommand::Play { role, .. } = &mut self.command {
            *role = new_role;
        }
        self
    }

    /// Human-readable label: the title if it isn't blank, otherwise a
    /// description of the command
    pub fn label(&self) -> String {
        if let Some(title) = self.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                return title.to_string();
            }
        }
        match &self.command {
            ControlCommand::Play { pattern, .. } => pattern.clone(),
            ControlCommand::Hit { options, .. } => {
                let names: Vec<&str> = options.iter().map(|o| o.name()).collect();
                format!("Hit {}", names.join(" or "))
            }
            ControlCommand::Finish => "Finish".to_string(),
            ControlCommand::Stop => "Stop now!".to_string(),
            ControlCommand::NoOp => "Does nothing".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Control::play(60, "Verse", "HALF_TIME", 4).label(), "Verse");
        assert_eq!(
            Control::hit(61, vec![DrumPiece::Crash, DrumPiece::China], 110).label(),
            "Hit crash or china"
        );
        assert_eq!(Control::finish(62).label(), "Finish");
        assert_eq!(Control::stop(63).label(), "Stop now!");
        assert_eq!(Control::noop(64).label(), "Does nothing");
    }

    #[test]
    fn test_title_overrides_label() {
        assert_eq!(Control::stop(63).with_title("Panic").label(), "Panic");
        assert_eq!(Control::stop(63).with_title("   ").label(), "Stop now!");
    }

    #[test]
    fn test_builders_only_touch_play() {
        let stop = Control::stop(1).immediate().with_tempo(90);
        assert_eq!(stop.command, ControlCommand::Stop);

        let play = Control::play(60, "Verse", "HALF_TIME", 4)
            .immediate()
            .with_tempo(90)
            .with_role(PatternRole::Fill);
        match play.command {
            ControlCommand::Play {
                switch_mode,
                tempo,
                role,
                ..
            } => {
                assert_eq!(switch_mode, SwitchMode::Immediate);
                assert_eq!(tempo, Some(90));
                assert_eq!(role, PatternRole::Fill);
            }
            other => panic!("expected play, got {:?}", other),
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_shape() {
        let json = r#"[
            {"key": 60, "kind": "play", "pattern": "Verse", "generator": "half_time", "length_in_measures": 4},
            {"key": 61, "kind": "play", "pattern": "Verse", "switch_mode": "immediate"},
            {"key": 62, "title": "Crash", "kind": "hit", "options": ["crash", "china"]},
            {"key": 63, "kind": "stop"},
            {"key": 64, "kind": "no_op"}
        ]"#;
        let controls: Vec<Control> = serde_json::from_str(json).unwrap();

        assert_eq!(controls.len(), 5);
        assert_eq!(controls[2].label(), "Crash");
        assert_eq!(
            controls[2].command,
            ControlCommand::Hit {
                options: vec![DrumPiece::Crash, DrumPiece::China],
                velocity: 100
            }
        );
        match &controls[1].command {
            ControlCommand::Play {
                generator,
                switch_mode,
                length_in_measures,
                ..
            } => {
                assert!(generator.is_none());
                assert_eq!(*switch_mode, SwitchMode::Immediate);
                assert_eq!(*length_in_measures, 1);
            }
            other => panic!("expected play, got {:?}", other),
        }
        assert_eq!(controls[4].command, ControlCommand::NoOp);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_time_signature_as_string() {
        let control = Control::play(60, "Odd", "BLAST_BEAT", 2)
            .with_time_signature(TimeSignature::new(7, 8).unwrap());
        let json = serde_json::to_string(&control).unwrap();
        assert!(json.contains("\"time_signature\":\"7/8\""));
    }
}
