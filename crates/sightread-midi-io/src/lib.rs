//! MIDI input for the sightread practice engine.
//!
//! Turns raw MIDI byte streams into note-pressed callbacks and a reactive
//! set of held keys, and connects to hardware input devices.
//!
//! Feature gates: `midi-io` (hardware input via midir). Without it,
//! [`MidiInputManager::connect`] reports MIDI as unavailable and input can
//! still be injected programmatically.

pub mod error;
pub use error::{Error, Result};

mod event;
pub use event::{NoteEvent, RawMidiMessage, NOTE_OFF, NOTE_ON};

mod normalizer;
pub use normalizer::{ActiveNotes, MidiNormalizer};

mod status;
pub use status::{MidiStatus, ACCESS_DENIED};

mod io;
pub use io::{MidiInputDevice, MidiInputManager};
