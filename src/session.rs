//! Practice session: wires note presses to scoring and feedback.

use crate::audio::{AudioFeedback, ToneSink};
use crossbeam_channel::Receiver;
use sightread_core::{KeyValueStore, PracticeQueue, ProgressStore, QueueSnapshot};
use sightread_midi_io::MidiNormalizer;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Progress, queue and feedback for one learner.
///
/// Scoring runs synchronously in whatever calls
/// [`on_note_pressed`](Self::on_note_pressed): a MIDI callback registered by
/// [`attach`](Self::attach), or keyboard/mouse input routed directly.
#[derive(Debug)]
pub struct PracticeSession<S: KeyValueStore, T: ToneSink> {
    progress: ProgressStore<S>,
    queue: PracticeQueue,
    feedback: AudioFeedback<T>,
    tone_duration: Duration,
}

impl<S: KeyValueStore, T: ToneSink> PracticeSession<S, T> {
    /// Build a session and fill its queue from the stored progress.
    pub fn new(
        progress: ProgressStore<S>,
        mut queue: PracticeQueue,
        feedback: AudioFeedback<T>,
        tone_duration: Duration,
    ) -> Self {
        queue.reset(&progress);
        Self {
            progress,
            queue,
            feedback,
            tone_duration,
        }
    }

    /// Score a played pitch against the head of the queue. A correct answer
    /// plays the feedback tone for the played pitch.
    pub fn on_note_pressed(&mut self, pitch: u8) -> bool {
        let correct = self.queue.check_note(pitch, &mut self.progress);
        if correct {
            self.feedback.play(pitch, self.tone_duration);
        }
        correct
    }

    /// Start a fresh run: new cards, tally back to zero. Stored progress is
    /// kept.
    pub fn reset(&mut self) {
        self.queue.reset(&self.progress);
    }

    /// Forget all stored progress. The current queue is left as is.
    pub fn reset_progress(&mut self) {
        self.progress.reset_progress();
    }

    /// Drop the current card unscored.
    pub fn skip(&mut self) {
        self.queue.next_note(&self.progress);
    }

    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    pub fn queue(&self) -> &PracticeQueue {
        &self.queue
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    pub fn subscribe(&mut self) -> Receiver<QueueSnapshot> {
        self.queue.subscribe()
    }

    pub fn feedback(&self) -> &AudioFeedback<T> {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut AudioFeedback<T> {
        &mut self.feedback
    }

    pub fn tone_duration(&self) -> Duration {
        self.tone_duration
    }
}

impl<S, T> PracticeSession<S, T>
where
    S: KeyValueStore + 'static,
    T: ToneSink + 'static,
{
    /// Register `session` as a note-pressed listener on `normalizer`.
    pub fn attach(session: &Rc<RefCell<Self>>, normalizer: &mut MidiNormalizer) {
        let session = Rc::clone(session);
        normalizer.on_note_pressed(move |pitch| match session.try_borrow_mut() {
            Ok(mut session) => {
                session.on_note_pressed(pitch);
            }
            Err(_) => tracing::warn!("Session busy, dropping note {}", pitch),
        });
    }
}
