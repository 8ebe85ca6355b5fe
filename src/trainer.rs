//! Trainer that owns the practice session and its MIDI input.

use crate::audio::ToneSink;
use crate::session::PracticeSession;
use crossbeam_channel::Receiver;
use sightread_core::{KeyValueStore, ProgressSummary, QueueSnapshot, TrainerConfig};
use sightread_midi_io::{ActiveNotes, MidiInputManager, MidiNormalizer, MidiStatus};
use std::cell::RefCell;
use std::rc::Rc;

/// Session type held by a [`Trainer`].
pub type DynSession = PracticeSession<Box<dyn KeyValueStore>, Box<dyn ToneSink>>;

/// Session shared between the trainer and the normalizer's callback.
pub type SharedSession = Rc<RefCell<DynSession>>;

/// The practice engine's context object.
///
/// Everything runs on the thread that owns the trainer. Hardware MIDI
/// arrives on a channel and is processed by [`pump`](Self::pump); UI input
/// goes through [`press`](Self::press).
///
/// # Example
///
/// ```ignore
/// use sightread::prelude::*;
///
/// let mut trainer = Trainer::builder()
///     .pitch_range(48, 72)
///     .progress_file("progress.json")
///     .midi()
///     .build()?;
///
/// loop {
///     trainer.pump();
///     let snapshot = trainer.snapshot();
///     // draw snapshot.cards ...
/// }
/// ```
pub struct Trainer {
    config: TrainerConfig,
    session: SharedSession,
    normalizer: MidiNormalizer,
    midi: MidiInputManager,
}

impl Trainer {
    pub fn builder() -> crate::TrainerBuilder {
        crate::TrainerBuilder::default()
    }

    pub(crate) fn from_parts(
        config: TrainerConfig,
        session: SharedSession,
        normalizer: MidiNormalizer,
        midi: MidiInputManager,
    ) -> Self {
        Self {
            config,
            session,
            normalizer,
            midi,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Feed every pending MIDI message to the normalizer. Returns how many
    /// messages were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        for message in self.midi.poll() {
            self.normalizer.handle_message(&message.bytes);
            processed += 1;
        }
        processed
    }

    /// Score a pitch chosen without MIDI (on-screen keyboard, computer keys).
    pub fn press(&mut self, pitch: u8) -> bool {
        match self.session.try_borrow_mut() {
            Ok(mut session) => session.on_note_pressed(pitch),
            Err(_) => {
                tracing::warn!("Session busy, dropping note {}", pitch);
                false
            }
        }
    }

    /// Queue raw MIDI bytes as if a device had sent them.
    pub fn inject(&self, bytes: &[u8]) -> bool {
        self.midi.inject(bytes)
    }

    /// Ask for hardware MIDI access. See [`MidiInputManager::connect`].
    pub fn connect_midi(&self) -> MidiStatus {
        self.midi.connect()
    }

    pub fn disconnect_midi(&self) {
        self.midi.disconnect();
    }

    pub fn midi_status(&self) -> MidiStatus {
        self.midi.status()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.session.borrow().snapshot()
    }

    pub fn subscribe_queue(&self) -> Receiver<QueueSnapshot> {
        self.session.borrow_mut().subscribe()
    }

    pub fn active_notes(&self) -> ActiveNotes {
        self.normalizer.active_notes()
    }

    pub fn subscribe_active_notes(&mut self) -> Receiver<ActiveNotes> {
        self.normalizer.subscribe()
    }

    pub fn summary(&self) -> ProgressSummary {
        self.session.borrow().progress().summary()
    }

    pub fn accuracy(&self) -> u32 {
        self.session.borrow().queue().accuracy()
    }

    /// Flip the feedback sound. Returns whether sound is now on.
    pub fn toggle_audio(&self) -> bool {
        self.session.borrow_mut().feedback_mut().toggle()
    }

    pub fn audio_enabled(&self) -> bool {
        self.session.borrow().feedback().is_enabled()
    }

    /// New cards and a zeroed tally; stored progress is kept.
    pub fn reset(&self) {
        self.session.borrow_mut().reset();
    }

    pub fn reset_progress(&self) {
        self.session.borrow_mut().reset_progress();
    }

    pub fn skip(&self) {
        self.session.borrow_mut().skip();
    }
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("config", &self.config)
            .field("normalizer", &self.normalizer)
            .field("midi", &self.midi)
            .finish_non_exhaustive()
    }
}
