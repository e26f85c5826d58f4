use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::note::{Note, NoteName, REST_MARKER};

/// Phrase boundary token. Never synthesized.
pub const SEPARATOR: &str = ",";

/// A parsed notation: notes sounding together for `duration` units
///
/// `"c4e4g42"` is a C major triad held for two units, `"_1"` is a one-unit
/// rest and `","` is the separator (no notes, zero duration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notation {
    pub notes: Vec<Note>,
    pub duration: u32,
    separator: bool,
}

impl Notation {
    pub fn new(notes: Vec<Note>, duration: u32) -> Self {
        Self {
            notes,
            duration,
            separator: false,
        }
    }

    pub fn separator() -> Self {
        Self {
            notes: Vec::new(),
            duration: 0,
            separator: true,
        }
    }

    pub fn is_separator(&self) -> bool {
        self.separator
    }

    /// Fundamental frequency of every note, in notation order
    pub fn frequencies(&self) -> Vec<f64> {
        self.notes.iter().map(Note::frequency).collect()
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.separator {
            return f.write_str(SEPARATOR);
        }
        for note in &self.notes {
            write!(f, "{}", note)?;
        }
        write!(f, "{}", self.duration)
    }
}

impl FromStr for Notation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_notation(s)
    }
}

/// Parse one notation token into its notes and duration.
///
/// Note segments are a letter plus an octave digit, rests are the single
/// character `_`. Scanning stops at the first character that starts neither,
/// and the rest of the token must be an unsigned integer duration. `E` and
/// `B` look like sharps but have none, so they fail with `UnknownNote`.
pub fn parse_notation(notation: &str) -> Result<Notation> {
    if notation == SEPARATOR {
        return Ok(Notation::separator());
    }

    let mut notes = Vec::new();
    let mut chars = notation.char_indices().peekable();
    let mut duration_start = notation.len();

    while let Some(&(idx, c)) = chars.peek() {
        if c == REST_MARKER {
            chars.next();
            notes.push(Note::Rest);
        } else if let Ok(name) = NoteName::from_symbol(c) {
            chars.next();
            let octave = match chars.next() {
                Some((_, digit)) if digit.is_ascii_digit() => digit as u8 - b'0',
                Some((_, other)) => {
                    return Err(Error::parse(
                        notation,
                        format!("octave after '{}' must be a digit, got '{}'", c, other),
                    ));
                }
                None => {
                    return Err(Error::parse(
                        notation,
                        format!("missing octave after '{}'", c),
                    ));
                }
            };
            notes.push(Note::new(name, octave));
        } else if NoteName::is_missing_sharp(c) {
            return Err(Error::UnknownNote(c));
        } else {
            duration_start = idx;
            break;
        }
    }

    let suffix = &notation[duration_start..];
    if suffix.is_empty() {
        return Err(Error::parse(notation, "missing duration"));
    }
    let duration = suffix.parse::<u32>().map_err(|_| {
        if suffix.starts_with('-') {
            Error::parse(notation, format!("negative duration {}", suffix))
        } else {
            Error::parse(notation, format!("invalid duration '{}'", suffix))
        }
    })?;

    Ok(Notation::new(notes, duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_note() {
        let n = parse_notation("a41").unwrap();
        assert_eq!(n.notes, vec![Note::new(NoteName::A, 4)]);
        assert_eq!(n.duration, 1);
        assert!(!n.is_separator());
    }

    #[test]
    fn test_parse_chord() {
        let n = parse_notation("c4e4120").unwrap();
        assert_eq!(
            n.notes,
            vec![Note::new(NoteName::C, 4), Note::new(NoteName::E, 4)]
        );
        assert_eq!(n.duration, 120);
    }

    #[test]
    fn test_parse_sharps() {
        let n = parse_notation("C3F52").unwrap();
        assert_eq!(
            n.notes,
            vec![Note::new(NoteName::CSharp, 3), Note::new(NoteName::FSharp, 5)]
        );
        assert_eq!(n.duration, 2);
    }

    #[test]
    fn test_parse_rest_is_one_character() {
        let n = parse_notation("_1").unwrap();
        assert_eq!(n.notes, vec![Note::Rest]);
        assert_eq!(n.duration, 1);

        // The digits after `_` are all duration
        let n = parse_notation("_41").unwrap();
        assert_eq!(n.notes, vec![Note::Rest]);
        assert_eq!(n.duration, 41);
    }

    #[test]
    fn test_parse_separator() {
        let n = parse_notation(",").unwrap();
        assert!(n.is_separator());
        assert!(n.notes.is_empty());
        assert_eq!(n.duration, 0);
    }

    #[test]
    fn test_parse_duration_only() {
        let n = parse_notation("120").unwrap();
        assert!(n.notes.is_empty());
        assert_eq!(n.duration, 120);
        assert!(!n.is_separator());
    }

    #[test]
    fn test_missing_duration() {
        assert!(matches!(parse_notation("c4"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation(""), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_bad_duration() {
        assert!(matches!(parse_notation("c4x"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation("c4-1"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation("c41.5"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation("a41x"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_other_letters_end_the_scan() {
        // Not note names, so they are read as a (bad) duration
        assert!(matches!(parse_notation("h41"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation("c4x1"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation("x"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_bad_octave() {
        assert!(matches!(parse_notation("c"), Err(Error::Parse { .. })));
        assert!(matches!(parse_notation("c_1"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_unknown_note() {
        assert!(matches!(parse_notation("E41"), Err(Error::UnknownNote('E'))));
        assert!(matches!(parse_notation("c4B41"), Err(Error::UnknownNote('B'))));
    }

    #[test]
    fn test_display_matches_input() {
        for text in ["c4e4120", "_1", ",", "A3b42", "7"] {
            assert_eq!(parse_notation(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_frequencies() {
        let n: Notation = "a4_2".parse().unwrap();
        assert_eq!(n.frequencies(), vec![440.0, 0.0]);
    }
}
