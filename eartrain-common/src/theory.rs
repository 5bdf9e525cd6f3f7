//! Scale-degree parsing and chord voicing
//!
//! Turns Roman-numeral progressions (`ii7 V7 Imaj7`) into MIDI note numbers
//! in a given key and mode, ready for Web MIDI / Web Audio playback.
//!
//! Numeral case selects the triad (upper = major, lower = minor). An optional
//! `b`/`#` prefix alters the root; suffixes select other qualities:
//! `7`, `maj7`, `6`, `°`/`dim`, `°7`/`dim7`, `ø`/`ø7`/`m7b5`, `+`/`aug`,
//! `+7`, `sus2`, `sus4`.

use serde::Serialize;

use crate::models::Mode;
use crate::validation::ValidationError;

/// MIDI note of middle C (C4)
pub const MIDDLE_C: u8 = 60;

const MAJOR_SCALE: [i16; 7] = [0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR_SCALE: [i16; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Longest numerals first so `vii` is not read as `v` + `ii`
const NUMERALS: [(&str, usize); 7] = [
    ("vii", 7),
    ("iii", 3),
    ("vi", 6),
    ("iv", 4),
    ("ii", 2),
    ("v", 5),
    ("i", 1),
];

/// Chord quality with its interval structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    MinorMajor7,
    Diminished7,
    HalfDiminished7,
    Augmented7,
    Major6,
    Minor6,
    Sus2,
    Sus4,
}

impl ChordQuality {
    /// Semitones above the root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::MinorMajor7 => &[0, 3, 7, 11],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Augmented7 => &[0, 4, 8, 10],
            ChordQuality::Major6 => &[0, 4, 7, 9],
            ChordQuality::Minor6 => &[0, 3, 7, 9],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }
}

/// Parsed Roman-numeral degree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Degree {
    /// Scale degree 1-7
    pub step: usize,
    /// Semitone alteration from a `b`/`#` prefix
    pub accidental: i16,
    pub quality: ChordQuality,
}

/// One chord of a voiced progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordVoicing {
    pub symbol: String,
    pub root: u8,
    pub quality: ChordQuality,
    pub notes: Vec<u8>,
}

/// Parse a key name (`C`, `F#`, `Bb`, `eb`) to its pitch class 0-11
pub fn parse_key(key: &str) -> Result<u8, ValidationError> {
    let invalid = || ValidationError::new("key", format!("Unknown key '{}'", key));
    let mut chars = key.trim().chars();

    let letter = chars.next().ok_or_else(invalid)?;
    let natural: i16 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };

    let accidental: i16 = match chars.as_str() {
        "" => 0,
        "#" | "♯" => 1,
        "b" | "♭" => -1,
        _ => return Err(invalid()),
    };

    Ok((natural + accidental).rem_euclid(12) as u8)
}

/// Parse one Roman-numeral degree symbol
pub fn parse_degree(symbol: &str) -> Result<Degree, ValidationError> {
    let invalid = |why: &str| {
        ValidationError::new("degrees", format!("Invalid degree '{}': {}", symbol, why))
    };

    let mut rest = symbol.trim();
    let mut accidental = 0;
    if let Some(stripped) = rest.strip_prefix('b').or_else(|| rest.strip_prefix('♭')) {
        accidental = -1;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('#').or_else(|| rest.strip_prefix('♯')) {
        accidental = 1;
        rest = stripped;
    }

    let lower = rest.to_ascii_lowercase();
    let (numeral_len, step) = NUMERALS
        .iter()
        .find(|(numeral, _)| lower.starts_with(numeral))
        .map(|(numeral, step)| (numeral.len(), *step))
        .ok_or_else(|| invalid("expected a numeral I-VII"))?;

    let (numeral, suffix) = rest.split_at(numeral_len);
    let upper_case = if numeral.chars().all(|c| c.is_ascii_uppercase()) {
        true
    } else if numeral.chars().all(|c| c.is_ascii_lowercase()) {
        false
    } else {
        return Err(invalid("mixed-case numeral"));
    };

    let quality = match (suffix, upper_case) {
        ("", true) => ChordQuality::Major,
        ("", false) => ChordQuality::Minor,
        ("7", true) => ChordQuality::Dominant7,
        ("7", false) => ChordQuality::Minor7,
        ("maj7" | "M7" | "Δ7", true) => ChordQuality::Major7,
        ("maj7" | "M7" | "Δ7", false) => ChordQuality::MinorMajor7,
        ("6", true) => ChordQuality::Major6,
        ("6", false) => ChordQuality::Minor6,
        ("°" | "o" | "dim", _) => ChordQuality::Diminished,
        ("°7" | "o7" | "dim7", _) => ChordQuality::Diminished7,
        ("ø" | "ø7" | "m7b5", _) => ChordQuality::HalfDiminished7,
        ("+" | "aug", _) => ChordQuality::Augmented,
        ("+7" | "aug7", _) => ChordQuality::Augmented7,
        ("sus2", _) => ChordQuality::Sus2,
        ("sus4" | "sus", _) => ChordQuality::Sus4,
        _ => return Err(invalid("unknown chord suffix")),
    };

    Ok(Degree {
        step,
        accidental,
        quality,
    })
}

/// Check that every degree of a progression parses
pub fn validate_degrees(degrees: &[String]) -> Result<(), ValidationError> {
    if degrees.is_empty() {
        return Err(ValidationError::new("degrees", "At least one degree is required"));
    }
    for degree in degrees {
        parse_degree(degree)?;
    }
    Ok(())
}

/// MIDI root of `degree` in a key rooted at `tonic` (MIDI note)
fn degree_root(tonic: u8, mode: Mode, degree: &Degree) -> u8 {
    let scale = match mode {
        Mode::Major => &MAJOR_SCALE,
        Mode::Minor => &NATURAL_MINOR_SCALE,
    };
    let offset = scale[degree.step - 1] + degree.accidental;
    (tonic as i16 + offset).clamp(0, 127) as u8
}

/// Voice a whole progression in `key` (tonic in octave 4)
///
/// # Examples
///
/// ```
/// use eartrain_common::models::Mode;
/// use eartrain_common::theory::voice_progression;
///
/// let chords = voice_progression(&["I".into(), "V7".into()], "C", Mode::Major).unwrap();
/// assert_eq!(chords[0].notes, vec![60, 64, 67]);
/// assert_eq!(chords[1].notes, vec![67, 71, 74, 77]);
/// ```
pub fn voice_progression(
    degrees: &[String],
    key: &str,
    mode: Mode,
) -> Result<Vec<ChordVoicing>, ValidationError> {
    let tonic = MIDDLE_C + parse_key(key)?;

    degrees
        .iter()
        .map(|symbol| {
            let degree = parse_degree(symbol)?;
            let root = degree_root(tonic, mode, &degree);
            let notes = degree
                .quality
                .intervals()
                .iter()
                .map(|interval| root.saturating_add(*interval).min(127))
                .collect();
            Ok(ChordVoicing {
                symbol: symbol.trim().to_string(),
                root,
                quality: degree.quality,
                notes,
            })
        })
        .collect()
}
