//! Look-ahead queue of upcoming notes.
//!
//! The head card is the note the player is expected to play. The queue is
//! refilled from the [`NoteSampler`] after every mutation so it holds exactly
//! `capacity` cards between calls. A [`QueueSnapshot`] is published to
//! subscribers after each mutating operation.

use crate::note::NoteCard;
use crate::observe::Observers;
use crate::progress::{ProgressStore, WeightSource};
use crate::sampler::NoteSampler;
use crate::store::KeyValueStore;
use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of upcoming notes shown to the player.
pub const DEFAULT_QUEUE_LEN: usize = 6;

/// Correct/total answers for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionTally {
    pub correct_count: u32,
    pub total_count: u32,
}

impl SessionTally {
    /// Percentage of correct answers, rounded; `0` before the first answer.
    pub fn accuracy(&self) -> u32 {
        if self.total_count == 0 {
            return 0;
        }
        (self.correct_count as f64 / self.total_count as f64 * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Filling,
    Ready,
}

/// Immutable view of the queue after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub cards: Arc<[NoteCard]>,
    pub tally: SessionTally,
}

impl QueueSnapshot {
    pub fn current(&self) -> Option<&NoteCard> {
        self.cards.first()
    }

    pub fn accuracy(&self) -> u32 {
        self.tally.accuracy()
    }
}

pub struct PracticeQueue<R = StdRng> {
    cards: VecDeque<NoteCard>,
    capacity: usize,
    tally: SessionTally,
    sampler: NoteSampler<R>,
    observers: Observers<QueueSnapshot>,
}

impl<R: Rng> PracticeQueue<R> {
    /// Create an empty queue. Call [`reset`](Self::reset) or
    /// [`fill`](Self::fill) before checking notes.
    pub fn new(capacity: usize, sampler: NoteSampler<R>) -> Self {
        let capacity = capacity.max(1);
        Self {
            cards: VecDeque::with_capacity(capacity),
            capacity,
            tally: SessionTally::default(),
            sampler,
            observers: Observers::new(),
        }
    }

    /// Top the queue up to capacity. No-op when already full.
    pub fn fill(&mut self, weights: &impl WeightSource) {
        let before = self.cards.len();
        self.top_up(weights);
        if self.cards.len() != before {
            self.publish();
        }
    }

    fn top_up(&mut self, weights: &impl WeightSource) {
        while self.cards.len() < self.capacity {
            let card = self.sampler.generate(weights);
            tracing::trace!("Queued {}", card);
            self.cards.push_back(card);
        }
    }

    /// Clear the tally and the queue, then refill.
    pub fn reset(&mut self, weights: &impl WeightSource) {
        self.tally = SessionTally::default();
        self.cards.clear();
        self.top_up(weights);
        tracing::debug!("Practice queue reset ({} cards)", self.cards.len());
        self.publish();
    }

    /// Score `played` against the head card.
    ///
    /// The attempt is recorded against the expected pitch. On a match the
    /// head is consumed and the queue refilled. Returns `false` without side
    /// effects when the queue is empty.
    pub fn check_note<S: KeyValueStore>(
        &mut self,
        played: u8,
        progress: &mut ProgressStore<S>,
    ) -> bool {
        let Some(expected) = self.cards.front().map(NoteCard::midi_note) else {
            return false;
        };

        self.tally.total_count += 1;
        let is_correct = played == expected;
        progress.record_attempt(expected, is_correct);

        if is_correct {
            self.tally.correct_count += 1;
            self.cards.pop_front();
            self.top_up(&*progress);
        }

        tracing::debug!(
            "Played {} expecting {}: {}",
            played,
            expected,
            if is_correct { "correct" } else { "wrong" }
        );
        self.publish();
        is_correct
    }

    /// Drop the head card without scoring it and refill.
    pub fn next_note(&mut self, weights: &impl WeightSource) {
        self.cards.pop_front();
        self.top_up(weights);
        self.publish();
    }

    pub fn current(&self) -> Option<&NoteCard> {
        self.cards.front()
    }

    pub fn cards(&self) -> impl ExactSizeIterator<Item = &NoteCard> + '_ {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> QueueState {
        if self.cards.len() < self.capacity {
            QueueState::Filling
        } else {
            QueueState::Ready
        }
    }

    pub fn tally(&self) -> SessionTally {
        self.tally
    }

    pub fn accuracy(&self) -> u32 {
        self.tally.accuracy()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            cards: self.cards.iter().copied().collect(),
            tally: self.tally,
        }
    }

    /// Receive a snapshot after every change to the queue or tally.
    pub fn subscribe(&mut self) -> Receiver<QueueSnapshot> {
        self.observers.subscribe()
    }

    fn publish(&mut self) {
        if !self.observers.is_empty() {
            let snapshot = self.snapshot();
            self.observers.publish(snapshot);
        }
    }
}

impl<R> std::fmt::Debug for PracticeQueue<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticeQueue")
            .field("len", &self.cards.len())
            .field("capacity", &self.capacity)
            .field("tally", &self.tally)
            .finish()
    }
}
