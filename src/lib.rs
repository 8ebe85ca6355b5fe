//! # Sightread - Adaptive Note-Reading Trainer
//!
//! Practice engine for sight-reading drills: it shows a queue of notes,
//! scores what the learner plays, and steers future notes toward the ones
//! they miss.
//!
//! ## Architecture
//!
//! Sightread is an umbrella crate that coordinates:
//! - **sightread-core** - Progress store, weighted note sampler, practice queue
//! - **sightread-midi-io** - MIDI normalization, held keys, hardware input
//!
//! and adds the practice session, audio feedback and the [`Trainer`] that
//! owns them all.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sightread::prelude::*;
//!
//! let mut trainer = Trainer::builder()
//!     .progress_file("progress.json")
//!     .midi()
//!     .build()?;
//!
//! if let Some(error) = trainer.midi_status().error {
//!     println!("{}", error);
//! }
//!
//! // Once per UI frame
//! trainer.pump();
//! let snapshot = trainer.snapshot();
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` - Hardware MIDI input (midir)
//! - `audio-out` - Feedback tones on the default output device (cpal)

/// Re-export of sightread-core for direct access
pub use sightread_core as core;

/// Re-export of sightread-midi-io for direct access
pub use sightread_midi_io as midi;

pub use sightread_core::{
    Accidental, Clef, JsonFileStore, KeyValueStore, MemoryStore, NoteCard, NoteName,
    NoteSampler, PracticeQueue, ProgressStore, ProgressSummary, QueueSnapshot, SessionTally,
    TrainerConfig, WeightCurve,
};

pub use sightread_midi_io::{
    ActiveNotes, MidiInputManager, MidiNormalizer, MidiStatus, NoteEvent, ACCESS_DENIED,
};

mod error;
pub use error::{Error, Result};

pub mod audio;
pub use audio::{
    AudioFeedback, RecordingSink, SilentSink, ToneMixer, ToneSink, ToneSpec, MAX_VOICES,
};

mod session;
pub use session::PracticeSession;

mod builder;
mod trainer;

pub use builder::TrainerBuilder;
pub use trainer::{DynSession, SharedSession, Trainer};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Trainer, TrainerBuilder};

    pub use crate::{Error, Result};

    pub use crate::{MidiStatus, NoteCard, QueueSnapshot, TrainerConfig, WeightCurve};

    pub use crate::{AudioFeedback, ToneSink};
}
