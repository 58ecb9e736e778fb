//! Deferred, cancellable transitions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pedalboard_core::Timestamp;

/// What a deferred transition does when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    /// Switch to another pattern at a measure boundary
    Switch { pattern: String },
    /// Stop at the end of the phrase
    Finish,
}

/// Cancellation flag shared between a scheduled transition and whoever may
/// want to call it off
#[derive(Debug, Clone, Default)]
pub struct TransitionHandle {
    cancelled: Arc<AtomicBool>,
}

impl TransitionHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A transition waiting for its boundary
#[derive(Debug, Clone)]
pub struct ScheduledTransition {
    fire_at: Timestamp,
    kind: TransitionKind,
    handle: TransitionHandle,
}

impl ScheduledTransition {
    pub fn new(fire_at: Timestamp, kind: TransitionKind) -> Self {
        Self {
            fire_at,
            kind,
            handle: TransitionHandle::default(),
        }
    }

    pub fn fire_at(&self) -> Timestamp {
        self.fire_at
    }

    pub fn kind(&self) -> &TransitionKind {
        &self.kind
    }

    pub fn handle(&self) -> TransitionHandle {
        self.handle.clone()
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.fire_at
    }

    /// Consume the transition; `None` if it was cancelled in the meantime
    pub fn fire(self) -> Option<TransitionKind> {
        if self.handle.is_cancelled() {
            None
        } else {
            Some(self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_checks_cancellation() {
        let transition = ScheduledTransition::new(Timestamp(2_000), TransitionKind::Finish);
        assert!(!transition.is_due(Timestamp(1_999)));
        assert!(transition.is_due(Timestamp(2_000)));

        let handle = transition.handle();
        handle.cancel();
        assert!(transition.fire().is_none());
    }

    #[test]
    fn test_fire_returns_kind() {
        let transition = ScheduledTransition::new(
            Timestamp(0),
            TransitionKind::Switch {
                pattern: "Chorus".to_string(),
            },
        );
        assert_eq!(
            transition.fire(),
            Some(TransitionKind::Switch {
                pattern: "Chorus".to_string()
            })
        );
    }
}
