//! Turns a raw MIDI byte stream into note-pressed callbacks and a set of
//! currently held keys.
//!
//! Decoding is best effort: anything that is not a well-formed note message
//! is dropped without error. The held-key set is replaced by a new
//! [`ActiveNotes`] snapshot whenever its membership changes, so holders of an
//! old snapshot can detect the change with a pointer comparison.

use crate::event::NoteEvent;
use crossbeam_channel::Receiver;
use sightread_core::Observers;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable snapshot of the keys currently held down.
pub type ActiveNotes = Arc<BTreeSet<u8>>;

type NoteCallback = Box<dyn FnMut(u8)>;

pub struct MidiNormalizer {
    active: ActiveNotes,
    callbacks: Vec<NoteCallback>,
    observers: Observers<ActiveNotes>,
}

impl MidiNormalizer {
    pub fn new() -> Self {
        Self {
            active: Arc::new(BTreeSet::new()),
            callbacks: Vec::new(),
            observers: Observers::new(),
        }
    }

    /// Register a listener for note-on events. Listeners run synchronously,
    /// in registration order, on the thread that feeds the normalizer.
    pub fn on_note_pressed(&mut self, callback: impl FnMut(u8) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Feed one raw message. Returns the decoded event, if any.
    pub fn handle_message(&mut self, bytes: &[u8]) -> Option<NoteEvent> {
        let Some(event) = NoteEvent::decode(bytes) else {
            tracing::trace!("Ignoring MIDI message {:02X?}", bytes);
            return None;
        };

        match event {
            NoteEvent::On { note, .. } => {
                self.update_active(|set| set.insert(note));
                for callback in self.callbacks.iter_mut() {
                    callback(note);
                }
            }
            NoteEvent::Off { note, .. } => {
                self.update_active(|set| set.remove(&note));
            }
        }
        Some(event)
    }

    /// Release every held key (all-notes-off).
    pub fn clear(&mut self) {
        self.update_active(|set| {
            let changed = !set.is_empty();
            set.clear();
            changed
        });
    }

    /// Current held-key snapshot.
    pub fn active_notes(&self) -> ActiveNotes {
        Arc::clone(&self.active)
    }

    pub fn is_active(&self, note: u8) -> bool {
        self.active.contains(&note)
    }

    /// Receive a new snapshot every time the held-key set changes.
    pub fn subscribe(&mut self) -> Receiver<ActiveNotes> {
        self.observers.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Apply `change` to a copy of the held set; publish the copy if
    /// `change` reports that membership changed.
    fn update_active(&mut self, change: impl FnOnce(&mut BTreeSet<u8>) -> bool) {
        let mut next = (*self.active).clone();
        if change(&mut next) {
            self.active = Arc::new(next);
            self.observers.publish(Arc::clone(&self.active));
        }
    }
}

impl Default for MidiNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MidiNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiNormalizer")
            .field("active", &self.active)
            .field("listeners", &self.callbacks.len())
            .finish()
    }
}
