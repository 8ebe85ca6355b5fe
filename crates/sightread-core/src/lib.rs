//! Adaptive practice engine for note-reading drills.
//!
//! # Primary API
//!
//! - [`ProgressStore`]: per-note accuracy counters and error weights
//! - [`NoteSampler`]: draws a pitch weighted by error weight and spells it as a [`NoteCard`]
//! - [`PracticeQueue`]: fixed-size look-ahead of upcoming cards, scored by [`PracticeQueue::check_note`]
//! - [`TrainerConfig`]: pitch range, queue length, weight curve, feedback tone length
//!
//! # Example
//!
//! ```ignore
//! use sightread_core::{MemoryStore, NoteSampler, PracticeQueue, ProgressStore, WeightCurve};
//!
//! let mut progress = ProgressStore::load(MemoryStore::default(), WeightCurve::Quadratic);
//! let mut queue = PracticeQueue::new(6, NoteSampler::new(36..=84));
//! queue.reset(&progress);
//!
//! let expected = queue.current().unwrap().midi_note();
//! assert!(queue.check_note(expected, &mut progress));
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::TrainerConfig;

pub mod note;
pub use note::{note_to_hz, Accidental, Clef, NoteCard, NoteName};

mod observe;
pub use observe::Observers;

mod progress;
pub use progress::{
    NoteStat, ProgressStore, ProgressSummary, WeightCurve, WeightSource, PROGRESS_KEY,
};

mod store;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

mod sampler;
pub use sampler::{pick_weighted, NoteSampler};

mod queue;
pub use queue::{PracticeQueue, QueueSnapshot, QueueState, SessionTally, DEFAULT_QUEUE_LEN};
