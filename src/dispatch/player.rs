//! Looping playback of one materialized pattern

use pedalboard_core::{
    Channel, Materialized, Phrase, Played, ResolvedContext, Signal, TimedNote, Timestamp,
};

use crate::processor::Processor;

/// Plays a phrase in a loop from `started_at`, using the context snapshot
/// taken when it started. Note-offs are held back until due so that stopping
/// can release them early.
#[derive(Debug)]
pub struct PatternPlayer {
    name: String,
    phrase: Phrase,
    context: ResolvedContext,
    started_at: Timestamp,
    phrase_millis: f64,
    /// Next note to play, and which repetition of the phrase it belongs to
    cursor: usize,
    iteration: u64,
    pending_offs: Vec<HeldNote>,
}

/// A note that has been struck and not yet released
#[derive(Debug, Clone, Copy)]
struct HeldNote {
    on_at: Timestamp,
    off_at: Timestamp,
    played: Played,
}

impl PatternPlayer {
    pub fn start(name: &str, materialized: Materialized, at: Timestamp) -> Self {
        let phrase_millis = materialized
            .context
            .beats_to_millis(materialized.phrase.length());
        Self {
            name: name.to_string(),
            phrase: materialized.phrase,
            context: materialized.context,
            started_at: at,
            phrase_millis,
            cursor: 0,
            iteration: 0,
            pending_offs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn context(&self) -> &ResolvedContext {
        &self.context
    }

    /// First measure boundary strictly after `now`
    pub fn next_measure_boundary(&self, now: Timestamp) -> Timestamp {
        self.next_boundary(now, self.context.measure_millis())
    }

    /// First end-of-phrase strictly after `now`
    pub fn next_phrase_boundary(&self, now: Timestamp) -> Timestamp {
        self.next_boundary(now, self.phrase_millis)
    }

    fn next_boundary(&self, now: Timestamp, period: f64) -> Timestamp {
        if period <= 0.0 {
            return now.after_millis(1);
        }
        let elapsed = now.since(self.started_at) as f64;
        let mut k = (elapsed / period).floor() + 1.0;
        loop {
            let boundary = self.started_at.after_millis((k * period).round() as u64);
            if boundary > now {
                return boundary;
            }
            k += 1.0;
        }
    }

    fn on_time(&self, note: &TimedNote) -> Timestamp {
        let ms = self.iteration as f64 * self.phrase_millis
            + self.context.beats_to_millis(note.offset);
        self.started_at.after_millis(ms.round() as u64)
    }

    fn hold_millis(&self, note: &TimedNote) -> u64 {
        (self.context.beats_to_millis(note.duration).round() as u64).max(1)
    }

    fn next_off(&self) -> Option<(usize, Timestamp)> {
        self.pending_offs
            .iter()
            .enumerate()
            .min_by_key(|(_, held)| held.off_at)
            .map(|(i, held)| (i, held.off_at))
    }

    fn step_cursor(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.phrase.len() {
            self.cursor = 0;
            self.iteration += 1;
        }
    }

    /// Emit every note-on and note-off due strictly before `until`.
    ///
    /// Notes more than a whole phrase behind are skipped rather than played
    /// in a burst.
    pub fn advance_until<P: Processor + ?Sized>(&mut self, until: Timestamp, processor: &P) {
        loop {
            let next_on = self
                .phrase
                .get(self.cursor)
                .copied()
                .map(|note| (self.on_time(&note), note));
            let next_off = self.next_off();

            // Offs go first on ties so a retriggered drum is released before it
            // is struck again
            match (next_on, next_off) {
                (_, Some((index, at))) if at < until && next_on.map_or(true, |(on, _)| at <= on) => {
                    let held = self.pending_offs.swap_remove(index);
                    processor.process(Signal::off(at, Channel::DRUMS, held.played));
                }
                (Some((at, note)), _) if at < until => {
                    self.step_cursor();
                    if (until.since(at) as f64) > self.phrase_millis {
                        continue;
                    }
                    let played = Played::new(note.pitch, note.velocity);
                    processor.process(Signal::on(at, Channel::DRUMS, played));
                    self.pending_offs.push(HeldNote {
                        on_at: at,
                        off_at: at.after_millis(self.hold_millis(&note)),
                        played,
                    });
                }
                _ => break,
            }
        }
    }

    /// Release everything still sounding at `at`. A note struck at `at`
    /// itself is released a millisecond later so its off never coincides
    /// with its on.
    pub fn stop<P: Processor + ?Sized>(&mut self, at: Timestamp, processor: &P) {
        let mut released: Vec<(Timestamp, Played)> = self
            .pending_offs
            .drain(..)
            .map(|held| (at.max(held.on_at.after_millis(1)), held.played))
            .collect();
        released.sort_by_key(|(off_at, _)| *off_at);
        for (off_at, played) in released {
            processor.process(Signal::off(off_at, Channel::DRUMS, played));
        }
    }

    pub fn sounding(&self) -> usize {
        self.pending_offs.len()
    }
}
