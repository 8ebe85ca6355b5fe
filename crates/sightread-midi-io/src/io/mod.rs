//! MIDI input transport.
//!
//! Raw messages from hardware (feature `midi-io`, via midir) or injected
//! programmatically arrive on one channel, to be drained by the thread that
//! owns the practice session.

mod input;

pub use input::{MidiInputDevice, MidiInputManager};
