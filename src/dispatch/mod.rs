//! Live dispatcher: turns pedal presses into signals and drives the pattern
//! state machine
//!
//! Every press on a bound key first emits a note-on/note-off pair for the
//! pressed key, then applies the bound action:
//!
//! | Action             | IDLE             | PLAYING(a)                                   |
//! |--------------------|------------------|----------------------------------------------|
//! | `Play(b, now)`     | PLAYING(b)       | PLAYING(b) at once                           |
//! | `Play(b, boundary)`| PLAYING(b)       | PLAYING(b) at a's next measure boundary      |
//! | `Hit`              | one-shot note    | one-shot note                                |
//! | `Finish`           | nothing          | IDLE at the end of a's phrase                |
//! | `Stop`             | nothing          | IDLE at once, pending transitions discarded  |
//! | `NoOp`             | nothing          | nothing                                      |
//!
//! Deferred transitions are fired from [`LiveDispatcher::tick`] and check
//! their cancellation flag before acting.

pub mod handle;
pub mod player;
pub mod schedule;

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, trace, warn};
use pedalboard_core::{
    Action, Channel, Configuration, ConfigurationError, DrumPiece, Pitch, Played, Signal,
    SwitchMode, Timestamp,
};
use thiserror::Error;

use crate::processor::Processor;

pub use handle::{DispatchCommand, DispatcherHandle};
pub use player::PatternPlayer;
pub use schedule::{ScheduledTransition, TransitionHandle, TransitionKind};

/// Default press velocity (matches what most pedal boards send)
pub const DEFAULT_VELOCITY: u8 = 100;

/// Pattern playback state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing(String),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing(name) => Some(name),
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "IDLE"),
            PlaybackState::Playing(name) => write!(f, "PLAYING({})", name),
        }
    }
}

/// One observed state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub from: PlaybackState,
    pub to: PlaybackState,
    pub at: Timestamp,
}

/// Something a successful build should have ruled out
#[derive(Debug, Error)]
pub enum RuntimeIntegrityError {
    #[error("key {key} plays pattern '{pattern}' which cannot be materialized")]
    MissingPattern {
        key: u8,
        pattern: String,
        #[source]
        source: ConfigurationError,
    },
}

/// Channel and default velocity for press signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressSettings {
    pub channel: Channel,
    pub velocity: u8,
}

impl Default for PressSettings {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            velocity: DEFAULT_VELOCITY,
        }
    }
}

pub struct LiveDispatcher<P: Processor> {
    config: Arc<Configuration>,
    processor: P,
    settings: PressSettings,
    state: PlaybackState,
    active: Option<PatternPlayer>,
    pending: Option<ScheduledTransition>,
    subscribers: Vec<Sender<StateChange>>,
}

impl<P: Processor> LiveDispatcher<P> {
    pub fn new(config: Arc<Configuration>, processor: P) -> Self {
        Self::with_settings(config, processor, PressSettings::default())
    }

    pub fn with_settings(config: Arc<Configuration>, processor: P, settings: PressSettings) -> Self {
        Self {
            config,
            processor,
            settings,
            state: PlaybackState::Idle,
            active: None,
            pending: None,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.config
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn settings(&self) -> PressSettings {
        self.settings
    }

    /// The transition waiting for its boundary, if any
    pub fn pending_transition(&self) -> Option<&ScheduledTransition> {
        self.pending.as_ref()
    }

    /// Receive every state change from now on
    pub fn subscribe(&mut self) -> Receiver<StateChange> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn add_subscriber(&mut self, tx: Sender<StateChange>) {
        self.subscribers.push(tx);
    }

    /// Press with the configured default velocity
    pub fn press(&mut self, key: u8, now: Timestamp) -> Result<(), RuntimeIntegrityError> {
        self.on_button_pressed(key, self.settings.velocity, now)
    }

    /// Handle one pedal press.
    ///
    /// Unbound keys are ignored. For a bound key the press pair is delivered
    /// before the action runs; if the action fails the state is unchanged.
    pub fn on_button_pressed(
        &mut self,
        key: u8,
        velocity: u8,
        now: Timestamp,
    ) -> Result<(), RuntimeIntegrityError> {
        // Bring playback up to date so due transitions happen before this
        // press, but leave notes starting at `now` to whatever the action
        // leaves playing
        self.catch_up(now, now);

        let config = Arc::clone(&self.config);
        let action = match config.action(key) {
            Some(action) => action,
            None => {
                trace!("key {} is not bound, ignoring", key);
                return Ok(());
            }
        };

        let (on, off) = Signal::press_pair(
            now,
            self.settings.channel,
            Played::new(Pitch::of(key), velocity),
        );
        self.processor.process(on);
        self.processor.process(off);

        debug!("key {}: {}", key, action);
        match action {
            Action::NoOp => {}
            Action::Play {
                pattern,
                switch_mode,
            } => self.play(key, pattern, *switch_mode, now)?,
            Action::Hit { options, velocity } => self.hit(options, *velocity, now),
            Action::Finish => self.finish(now),
            Action::Stop => self.stop(now),
        }
        Ok(())
    }

    /// Advance pattern playback to `now` and fire a due deferred transition
    pub fn tick(&mut self, now: Timestamp) {
        self.catch_up(now, now.after_millis(1));
    }

    /// Fire a transition due at `now`, then play notes starting before `until`
    fn catch_up(&mut self, now: Timestamp, until: Timestamp) {
        if self.pending.as_ref().is_some_and(|t| t.is_due(now)) {
            if let Some(transition) = self.pending.take() {
                let at = transition.fire_at();
                match transition.fire() {
                    Some(TransitionKind::Switch { pattern }) => self.fire_switch(&pattern, at),
                    Some(TransitionKind::Finish) => self.halt(at),
                    None => trace!("deferred transition at {} was cancelled", at),
                }
            }
        }

        if let Some(player) = self.active.as_mut() {
            player.advance_until(until, &self.processor);
        }
    }

    /// Swap in a freshly built configuration. Playback stops first; the new
    /// configuration replaces the old one in a single assignment.
    pub fn replace_configuration(&mut self, config: Arc<Configuration>, now: Timestamp) {
        self.stop(now);
        info!(
            "configuration '{}' replaced by '{}' ({} bindings)",
            self.config.name(),
            config.name(),
            config.len()
        );
        self.config = config;
    }

    fn play(
        &mut self,
        key: u8,
        pattern: &str,
        mode: SwitchMode,
        now: Timestamp,
    ) -> Result<(), RuntimeIntegrityError> {
        let same = self.active.as_ref().map(|p| p.name() == pattern);

        match (same, mode) {
            // Already playing this pattern and asked to wait: keep going
            (Some(true), SwitchMode::AtBoundary) => {
                self.cancel_pending();
                Ok(())
            }
            (None, _) | (Some(_), SwitchMode::Immediate) => {
                let materialized = self.config.patterns().materialize(pattern).map_err(|source| {
                    RuntimeIntegrityError::MissingPattern {
                        key,
                        pattern: pattern.to_string(),
                        source,
                    }
                })?;
                self.cancel_pending();
                if let Some(mut previous) = self.active.take() {
                    previous.advance_until(now, &self.processor);
                    previous.stop(now, &self.processor);
                }
                self.active = Some(PatternPlayer::start(pattern, materialized, now));
                self.set_state(PlaybackState::Playing(pattern.to_string()), now);
                Ok(())
            }
            (Some(false), SwitchMode::AtBoundary) => {
                // Make sure the target exists now rather than failing at the boundary
                if let Err(source) = self.config.patterns().resolve(pattern) {
                    return Err(RuntimeIntegrityError::MissingPattern {
                        key,
                        pattern: pattern.to_string(),
                        source,
                    });
                }
                let Some(active) = self.active.as_ref() else {
                    return Ok(());
                };
                let fire_at = active.next_measure_boundary(now);
                debug!(
                    "switch {} -> {} queued for {}",
                    active.name(),
                    pattern,
                    fire_at
                );
                self.schedule(ScheduledTransition::new(
                    fire_at,
                    TransitionKind::Switch {
                        pattern: pattern.to_string(),
                    },
                ));
                Ok(())
            }
        }
    }

    fn hit(&mut self, options: &[DrumPiece], velocity: u8, now: Timestamp) {
        let choice = options
            .iter()
            .find(|piece| !self.processor.is_sounding(Channel::DRUMS, piece.pitch()))
            .or_else(|| options.first());
        if let Some(piece) = choice {
            let (on, off) =
                Signal::press_pair(now, Channel::DRUMS, Played::new(piece.pitch(), velocity));
            self.processor.process(on);
            self.processor.process(off);
        }
    }

    fn finish(&mut self, now: Timestamp) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let fire_at = active.next_phrase_boundary(now);
        debug!("{} finishes at {}", active.name(), fire_at);
        self.schedule(ScheduledTransition::new(fire_at, TransitionKind::Finish));
    }

    /// Halt immediately and discard whatever was pending
    pub fn stop(&mut self, now: Timestamp) {
        self.cancel_pending();
        self.halt(now);
    }

    fn halt(&mut self, at: Timestamp) {
        if let Some(mut player) = self.active.take() {
            player.advance_until(at, &self.processor);
            player.stop(at, &self.processor);
        }
        self.set_state(PlaybackState::Idle, at);
    }

    fn fire_switch(&mut self, pattern: &str, at: Timestamp) {
        match self.config.patterns().materialize(pattern) {
            Ok(materialized) => {
                if let Some(mut previous) = self.active.take() {
                    previous.advance_until(at, &self.processor);
                    previous.stop(at, &self.processor);
                }
                self.active = Some(PatternPlayer::start(pattern, materialized, at));
                self.set_state(PlaybackState::Playing(pattern.to_string()), at);
            }
            Err(e) => warn!("switch to '{}' aborted: {}", pattern, e),
        }
    }

    fn schedule(&mut self, transition: ScheduledTransition) {
        self.cancel_pending();
        self.pending = Some(transition);
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle().cancel();
        }
    }

    fn set_state(&mut self, to: PlaybackState, at: Timestamp) {
        if self.state == to {
            return;
        }
        let from = std::mem::replace(&mut self.state, to.clone());
        debug!("{} -> {} at {}", from, to, at);
        let change = StateChange { from, to, at };
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}
