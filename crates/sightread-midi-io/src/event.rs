//! Raw MIDI messages and the note events decoded from them.

use smallvec::SmallVec;

/// Status high nibble of a Note Off message.
pub const NOTE_OFF: u8 = 0x8;
/// Status high nibble of a Note On message.
pub const NOTE_ON: u8 = 0x9;

/// Raw bytes as delivered by a transport, with the transport's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMidiMessage {
    /// Microseconds, relative to an arbitrary transport-defined origin.
    pub timestamp_us: u64,
    pub bytes: SmallVec<[u8; 4]>,
}

impl RawMidiMessage {
    pub fn new(timestamp_us: u64, bytes: &[u8]) -> Self {
        Self {
            timestamp_us,
            bytes: SmallVec::from_slice(bytes),
        }
    }
}

/// A key going down or coming up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    On { channel: u8, note: u8, velocity: u8 },
    Off { channel: u8, note: u8 },
}

impl NoteEvent {
    /// Decode a channel message into a note event.
    ///
    /// Note On with velocity 0 is a Note Off. Anything that is not a note
    /// message, is shorter than three bytes, or carries a data byte with the
    /// high bit set yields `None`. Bytes past the third are ignored.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let [status, note, velocity, ..] = *bytes else {
            return None;
        };
        // Data bytes are 7-bit; notes index a 128-slot held-key set.
        if note > 0x7F || velocity > 0x7F {
            return None;
        }

        let channel = status & 0x0F;
        match status >> 4 {
            NOTE_ON if velocity > 0 => Some(NoteEvent::On {
                channel,
                note,
                velocity,
            }),
            NOTE_ON | NOTE_OFF => Some(NoteEvent::Off { channel, note }),
            _ => None,
        }
    }

    #[inline]
    pub fn note(&self) -> u8 {
        match *self {
            NoteEvent::On { note, .. } | NoteEvent::Off { note, .. } => note,
        }
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        match *self {
            NoteEvent::On { channel, .. } | NoteEvent::Off { channel, .. } => channel,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, NoteEvent::On { .. })
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(self, NoteEvent::Off { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_note_on() {
        let event = NoteEvent::decode(&[0x90, 60, 100]).unwrap();
        assert_eq!(
            event,
            NoteEvent::On {
                channel: 0,
                note: 60,
                velocity: 100
            }
        );
        assert!(event.is_note_on());
    }

    #[test]
    fn test_decode_note_on_velocity_zero() {
        let event = NoteEvent::decode(&[0x93, 64, 0]).unwrap();
        assert_eq!(event, NoteEvent::Off { channel: 3, note: 64 });
        assert!(event.is_note_off());
    }

    #[test]
    fn test_decode_note_off() {
        // Release velocity is irrelevant.
        let event = NoteEvent::decode(&[0x8F, 72, 64]).unwrap();
        assert_eq!(event, NoteEvent::Off { channel: 15, note: 72 });
    }

    #[test]
    fn test_decode_ignores_other_commands() {
        assert_eq!(NoteEvent::decode(&[0xB0, 7, 100]), None); // CC
        assert_eq!(NoteEvent::decode(&[0xE0, 0, 64]), None); // pitch bend
        assert_eq!(NoteEvent::decode(&[0xA0, 60, 20]), None); // poly pressure
        assert_eq!(NoteEvent::decode(&[0xF8, 0, 0]), None); // clock
    }

    #[test]
    fn test_decode_short_messages() {
        assert_eq!(NoteEvent::decode(&[]), None);
        assert_eq!(NoteEvent::decode(&[0x90]), None);
        assert_eq!(NoteEvent::decode(&[0x90, 60]), None);
    }

    #[test]
    fn test_decode_extra_bytes_ignored() {
        let event = NoteEvent::decode(&[0x90, 48, 90, 0x12, 0x34]).unwrap();
        assert_eq!(event.note(), 48);
    }

    #[test]
    fn test_decode_rejects_bad_data_bytes() {
        assert_eq!(NoteEvent::decode(&[0x90, 0x80, 100]), None);
        assert_eq!(NoteEvent::decode(&[0x90, 60, 0xFF]), None);
    }

    #[test]
    fn test_raw_message_copies_bytes() {
        let raw = RawMidiMessage::new(12, &[0x90, 60, 100]);
        assert_eq!(raw.bytes.as_slice(), &[0x90, 60, 100]);
        assert!(!raw.bytes.spilled());
    }
}
