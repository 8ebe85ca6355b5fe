//! Note spelling and staff placement.
//!
//! A [`NoteCard`] is one upcoming note in the practice queue: the pitch plus
//! everything a staff renderer needs (letter name, accidental, octave, clef
//! and staff offset).
//!
//! # Example
//! ```ignore
//! use sightread_core::{Accidental, Clef, NoteCard, NoteName};
//!
//! let card = NoteCard::new(61, NoteName::D, Accidental::Flat);
//! assert_eq!(card.label(), "Db4");
//! assert_eq!(card.clef(), Clef::Treble);
//! ```

use serde::Serialize;
use std::fmt;

/// Middle C (C4).
pub const MIDDLE_C: u8 = 60;

#[inline]
pub fn note_to_hz(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Scientific-pitch octave of a MIDI note (MIDI 60 is octave 4).
#[inline]
pub fn octave_of(midi_note: u8) -> i8 {
    (midi_note / 12) as i8 - 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 7] = [
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
        NoteName::A,
        NoteName::B,
    ];

    /// Semitones above C within the octave.
    pub fn semitone(self) -> u8 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    pub fn offset(self) -> i8 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    /// Middle C and above read in treble, everything below in bass.
    pub fn for_pitch(midi_note: u8) -> Self {
        if midi_note >= MIDDLE_C {
            Clef::Treble
        } else {
            Clef::Bass
        }
    }

    /// Pitch the clef's staff offsets are measured from (C4 treble, C5 bass).
    ///
    /// Renderers place bass cards relative to C5, so every bass offset is
    /// positive.
    pub fn reference_pitch(self) -> u8 {
        match self {
            Clef::Treble => MIDDLE_C,
            Clef::Bass => MIDDLE_C + 12,
        }
    }
}

/// Signed offset of `midi_note` from the clef reference, in semitones.
/// Negative values sit higher on the staff.
pub fn staff_line(midi_note: u8, clef: Clef) -> i32 {
    -(midi_note as i32 - clef.reference_pitch() as i32)
}

const SPELLINGS: [&[(NoteName, Accidental)]; 12] = [
    &[(NoteName::C, Accidental::Natural)],
    &[(NoteName::C, Accidental::Sharp), (NoteName::D, Accidental::Flat)],
    &[(NoteName::D, Accidental::Natural)],
    &[(NoteName::D, Accidental::Sharp), (NoteName::E, Accidental::Flat)],
    &[(NoteName::E, Accidental::Natural)],
    &[(NoteName::F, Accidental::Natural)],
    &[(NoteName::F, Accidental::Sharp), (NoteName::G, Accidental::Flat)],
    &[(NoteName::G, Accidental::Natural)],
    &[(NoteName::G, Accidental::Sharp), (NoteName::A, Accidental::Flat)],
    &[(NoteName::A, Accidental::Natural)],
    &[(NoteName::A, Accidental::Sharp), (NoteName::B, Accidental::Flat)],
    &[(NoteName::B, Accidental::Natural)],
];

/// Valid spellings of a pitch class: one for white keys, sharp-of-lower and
/// flat-of-upper for black keys.
pub fn spellings(pitch_class: u8) -> &'static [(NoteName, Accidental)] {
    SPELLINGS[(pitch_class % 12) as usize]
}

/// One note in the practice queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NoteCard {
    midi_note: u8,
    note_name: NoteName,
    accidental: Accidental,
    octave: i8,
    clef: Clef,
    staff_line: i32,
}

impl NoteCard {
    /// Build a card from a pitch and one of its valid spellings.
    ///
    /// A spelling that does not belong to the pitch class falls back to the
    /// first valid spelling.
    pub fn new(midi_note: u8, note_name: NoteName, accidental: Accidental) -> Self {
        let options = spellings(midi_note % 12);
        let (note_name, accidental) = if options.contains(&(note_name, accidental)) {
            (note_name, accidental)
        } else {
            options[0]
        };
        let clef = Clef::for_pitch(midi_note);

        Self {
            midi_note,
            note_name,
            accidental,
            octave: octave_of(midi_note),
            clef,
            staff_line: staff_line(midi_note, clef),
        }
    }

    /// Card using the first valid spelling (sharps for black keys).
    pub fn from_pitch(midi_note: u8) -> Self {
        let (name, accidental) = spellings(midi_note % 12)[0];
        Self::new(midi_note, name, accidental)
    }

    #[inline]
    pub fn midi_note(&self) -> u8 {
        self.midi_note
    }

    #[inline]
    pub fn note_name(&self) -> NoteName {
        self.note_name
    }

    #[inline]
    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    #[inline]
    pub fn octave(&self) -> i8 {
        self.octave
    }

    #[inline]
    pub fn clef(&self) -> Clef {
        self.clef
    }

    #[inline]
    pub fn staff_line(&self) -> i32 {
        self.staff_line
    }

    /// Pitch spelled by name + accidental + octave.
    pub fn spelled_pitch(&self) -> i32 {
        (self.octave as i32 + 1) * 12
            + self.note_name.semitone() as i32
            + self.accidental.offset() as i32
    }

    pub fn frequency(&self) -> f32 {
        note_to_hz(self.midi_note as f32)
    }

    /// Scientific pitch label, e.g. `"F#3"`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NoteCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.note_name,
            self.accidental.symbol(),
            self.octave
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_middle_c() {
        let card = NoteCard::from_pitch(60);
        assert_eq!(card.note_name(), NoteName::C);
        assert_eq!(card.accidental(), Accidental::Natural);
        assert_eq!(card.octave(), 4);
        assert_eq!(card.clef(), Clef::Treble);
        assert_eq!(card.staff_line(), 0);
        assert_eq!(card.label(), "C4");
    }

    #[test]
    fn test_clef_boundary() {
        assert_eq!(Clef::for_pitch(59), Clef::Bass);
        assert_eq!(Clef::for_pitch(60), Clef::Treble);
    }

    #[test]
    fn test_staff_line_offsets() {
        // Treble measures from C4, bass from C5; higher pitches go negative.
        assert_eq!(staff_line(72, Clef::Treble), -12);
        assert_eq!(staff_line(64, Clef::Treble), -4);
        assert_eq!(staff_line(48, Clef::Bass), 24);
        assert_eq!(staff_line(59, Clef::Bass), 13);
        assert_eq!(staff_line(36, Clef::Bass), 36);
        assert_eq!(NoteCard::from_pitch(43).staff_line(), 29);
    }

    #[test]
    fn test_bass_cards_measure_from_c5() {
        for (midi, line) in [(36, 36), (48, 24), (53, 19), (59, 13)] {
            let card = NoteCard::from_pitch(midi);
            assert_eq!(card.clef(), Clef::Bass);
            assert_eq!(card.staff_line(), line, "midi {}", midi);
        }
        // Stepping across middle C jumps from the bass to the treble reference.
        assert_eq!(NoteCard::from_pitch(59).staff_line(), 13);
        assert_eq!(NoteCard::from_pitch(60).staff_line(), 0);
    }

    #[test]
    fn test_black_key_spellings() {
        assert_eq!(
            spellings(1),
            &[(NoteName::C, Accidental::Sharp), (NoteName::D, Accidental::Flat)]
        );
        assert_eq!(
            spellings(10),
            &[(NoteName::A, Accidental::Sharp), (NoteName::B, Accidental::Flat)]
        );
        let white: Vec<u8> = (0..12).filter(|pc| spellings(*pc).len() == 1).collect();
        assert_eq!(white, vec![0, 2, 4, 5, 7, 9, 11]);
    }

    #[test]
    fn test_flat_spelling_label() {
        let card = NoteCard::new(70, NoteName::B, Accidental::Flat);
        assert_eq!(card.label(), "Bb4");
        assert_eq!(card.spelled_pitch(), 70);
    }

    #[test]
    fn test_foreign_spelling_falls_back() {
        let card = NoteCard::new(61, NoteName::G, Accidental::Natural);
        assert_eq!(card.note_name(), NoteName::C);
        assert_eq!(card.accidental(), Accidental::Sharp);
    }

    #[test]
    fn test_frequency() {
        assert_relative_eq!(NoteCard::from_pitch(69).frequency(), 440.0);
        assert_relative_eq!(NoteCard::from_pitch(81).frequency(), 880.0, epsilon = 1e-3);
        assert_relative_eq!(note_to_hz(60.0), 261.6256, epsilon = 1e-3);
    }

    proptest! {
        #[test]
        fn prop_every_spelling_matches_pitch(midi in 0u8..=127) {
            for &(name, accidental) in spellings(midi % 12) {
                let card = NoteCard::new(midi, name, accidental);
                prop_assert_eq!(card.spelled_pitch(), midi as i32);
                prop_assert_eq!(card.note_name(), name);
                prop_assert_eq!(card.accidental(), accidental);
            }
        }

        #[test]
        fn prop_clef_and_staff_are_pure(midi in 0u8..=127) {
            let a = NoteCard::from_pitch(midi);
            let b = NoteCard::new(midi, spellings(midi % 12).last().unwrap().0, spellings(midi % 12).last().unwrap().1);
            prop_assert_eq!(a.clef(), b.clef());
            prop_assert_eq!(a.staff_line(), b.staff_line());
            prop_assert_eq!(a.octave(), b.octave());
        }
    }
}
