//! Actions and the trigger-key action table

use std::fmt;

use crate::types::DrumPiece;

/// Number of addressable trigger keys (MIDI notes 0-127)
pub const KEY_COUNT: usize = 128;

/// When a `Play` takes over from a pattern that is already playing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SwitchMode {
    /// Stop the current pattern and start the new one at once
    Immediate,
    /// Switch at the next measure boundary of the current pattern (default)
    #[default]
    AtBoundary,
}

/// What a bound trigger key does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start (or switch to) the named pattern
    Play {
        pattern: String,
        switch_mode: SwitchMode,
    },
    /// One-shot note from the first idle option, or the first option
    Hit { options: Vec<DrumPiece>, velocity: u8 },
    /// Stop at the end of the current phrase
    Finish,
    /// Stop now, dropping anything scheduled
    Stop,
    /// Bound, but does nothing
    NoOp,
}

impl Action {
    /// Short kind name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Play { .. } => "play",
            Action::Hit { .. } => "hit",
            Action::Finish => "finish",
            Action::Stop => "stop",
            Action::NoOp => "noop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Play {
                pattern,
                switch_mode,
            } => match switch_mode {
                SwitchMode::Immediate => write!(f, "play '{}' now", pattern),
                SwitchMode::AtBoundary => write!(f, "play '{}' at next measure", pattern),
            },
            Action::Hit { options, velocity } => {
                let names: Vec<&str> = options.iter().map(|o| o.name()).collect();
                write!(f, "hit {} (velocity {})", names.join(" or "), velocity)
            }
            Action::Finish => write!(f, "finish"),
            Action::Stop => write!(f, "stop"),
            Action::NoOp => write!(f, "no-op"),
        }
    }
}

/// Fixed-size table indexed directly by trigger key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    slots: Vec<Option<Action>>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self {
            slots: vec![None; KEY_COUNT],
        }
    }

    /// Bind `action` to `key`. Returns the action back if the key is out of
    /// range or already bound; the table is left unchanged.
    pub fn insert(&mut self, key: u8, action: Action) -> Result<(), Action> {
        match self.slots.get_mut(key as usize) {
            Some(slot @ None) => {
                *slot = Some(action);
                Ok(())
            }
            _ => Err(action),
        }
    }

    pub fn get(&self, key: u8) -> Option<&Action> {
        self.slots.get(key as usize).and_then(Option::as_ref)
    }

    pub fn contains(&self, key: u8) -> bool {
        self.get(key).is_some()
    }

    /// Bound keys with their actions, ascending by key
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Action)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(key, slot)| slot.as_ref().map(|a| (key as u8, a)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_mode_default() {
        assert_eq!(SwitchMode::default(), SwitchMode::AtBoundary);
    }

    #[test]
    fn test_insert_rejects_duplicates_and_out_of_range() {
        let mut table = ActionTable::new();
        assert!(table.insert(60, Action::Stop).is_ok());
        assert_eq!(table.insert(60, Action::Finish), Err(Action::Finish));
        assert_eq!(table.insert(128, Action::NoOp), Err(Action::NoOp));
        assert_eq!(table.get(60), Some(&Action::Stop));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_iter_in_key_order() {
        let mut table = ActionTable::new();
        table.insert(64, Action::Stop).unwrap();
        table.insert(60, Action::NoOp).unwrap();
        let keys: Vec<u8> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![60, 64]);
        assert!(!table.contains(61));
    }

    #[test]
    fn test_display() {
        let play = Action::Play {
            pattern: "Verse".to_string(),
            switch_mode: SwitchMode::Immediate,
        };
        assert_eq!(play.to_string(), "play 'Verse' now");
        let hit = Action::Hit {
            options: vec![DrumPiece::Crash, DrumPiece::China],
            velocity: 120,
        };
        assert_eq!(hit.to_string(), "hit crash or china (velocity 120)");
        assert_eq!(hit.kind(), "hit");
    }
}
