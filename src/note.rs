use std::fmt;

use crate::error::{Error, Result};

/// Reference pitch for A4
pub const A4_FREQ: f64 = 440.0;

/// Key number (88-key piano numbering) of A4
const A4_KEY_ID: i32 = 49;

/// Octaves the recorder can produce
pub const OCTAVE_RANGE: std::ops::RangeInclusive<u8> = 0..=8;

/// Silence marker in notation text
pub const REST_MARKER: char = '_';

/// Musical note names (chromatic scale)
///
/// In notation text a lowercase letter is the natural and an uppercase
/// letter is its sharp. `e` and `b` have no sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    /// Semitone within an octave (C=0, B=11)
    pub fn semitone(self) -> u8 {
        match self {
            NoteName::C => 0,
            NoteName::CSharp => 1,
            NoteName::D => 2,
            NoteName::DSharp => 3,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::FSharp => 6,
            NoteName::G => 7,
            NoteName::GSharp => 8,
            NoteName::A => 9,
            NoteName::ASharp => 10,
            NoteName::B => 11,
        }
    }

    /// Look up the note for a notation letter.
    pub fn from_symbol(c: char) -> Result<Self> {
        match c {
            'c' => Ok(NoteName::C),
            'C' => Ok(NoteName::CSharp),
            'd' => Ok(NoteName::D),
            'D' => Ok(NoteName::DSharp),
            'e' => Ok(NoteName::E),
            'f' => Ok(NoteName::F),
            'F' => Ok(NoteName::FSharp),
            'g' => Ok(NoteName::G),
            'G' => Ok(NoteName::GSharp),
            'a' => Ok(NoteName::A),
            'A' => Ok(NoteName::ASharp),
            'b' => Ok(NoteName::B),
            _ => Err(Error::UnknownNote(c)),
        }
    }

    /// `E` and `B`: uppercase letters whose natural has no sharp
    pub fn is_missing_sharp(c: char) -> bool {
        matches!(c, 'E' | 'B')
    }

    /// The notation letter for this note
    pub fn symbol(self) -> char {
        match self {
            NoteName::C => 'c',
            NoteName::CSharp => 'C',
            NoteName::D => 'd',
            NoteName::DSharp => 'D',
            NoteName::E => 'e',
            NoteName::F => 'f',
            NoteName::FSharp => 'F',
            NoteName::G => 'g',
            NoteName::GSharp => 'G',
            NoteName::A => 'a',
            NoteName::ASharp => 'A',
            NoteName::B => 'b',
        }
    }

    /// Piano key number, A4 = 49, C4 = 40
    pub fn key_id(self, octave: u8) -> i32 {
        self.semitone() as i32 + octave as i32 * 12 - 8
    }

    /// Frequency in Hz (A4 = 440 Hz, 12-TET)
    pub fn to_freq(self, octave: u8) -> f64 {
        // Whole octaves go through powi so that raising the octave doubles
        // the frequency exactly.
        let offset = self.key_id(octave) - A4_KEY_ID;
        let octaves = offset.div_euclid(12);
        let semitones = offset.rem_euclid(12);
        A4_FREQ * 2.0_f64.powi(octaves) * 2.0_f64.powf(semitones as f64 / 12.0)
    }
}

/// One segment of a notation: a pitched note or a rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    Pitched { name: NoteName, octave: u8 },
    Rest,
}

impl Note {
    pub fn new(name: NoteName, octave: u8) -> Self {
        Note::Pitched { name, octave }
    }

    /// Fundamental frequency in Hz. Rests are 0 Hz.
    pub fn frequency(&self) -> f64 {
        match *self {
            Note::Pitched { name, octave } => name.to_freq(octave),
            Note::Rest => 0.0,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Pitched { name, octave } => write!(f, "{}{}", name.symbol(), octave),
            Note::Rest => write!(f, "{}", REST_MARKER),
        }
    }
}
