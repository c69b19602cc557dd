//! Note names and octave resolution

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Octave number of an unmarked note in absolute entry (`c` is C3)
pub const BASE_OCTAVE: i32 = 3;

/// Diatonic step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'c' => Some(Step::C),
            'd' => Some(Step::D),
            'e' => Some(Step::E),
            'f' => Some(Step::F),
            'g' => Some(Step::G),
            'a' => Some(Step::A),
            'b' => Some(Step::B),
            _ => None,
        }
    }

    /// Diatonic index with C = 0
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn letter(self) -> char {
        match self {
            Step::C => 'C',
            Step::D => 'D',
            Step::E => 'E',
            Step::F => 'F',
            Step::G => 'G',
            Step::A => 'A',
            Step::B => 'B',
        }
    }
}

/// Absolute pitch in scientific octave numbering (middle C = C4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    /// Chromatic alteration in semitones
    pub alter: i32,
    pub octave: i32,
}

/// Middle C, the reference for relative entry when none was given
pub const MIDDLE_C: Pitch = Pitch {
    step: Step::C,
    alter: 0,
    octave: 4,
};

impl Pitch {
    pub fn new(step: Step, alter: i32, octave: i32) -> Self {
        Self { step, alter, octave }
    }

    /// Move this pitch, entered relative to `prev`, to the octave that puts it
    /// closest to `prev` (a fourth or less), keeping any octave offset it
    /// already carries
    pub fn make_absolute(&mut self, prev: &Pitch) {
        self.octave += prev.octave - (self.step.index() - prev.step.index() + 3).div_euclid(7);
    }
}

/// How the parser entered a note's octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchMode {
    #[default]
    #[serde(alias = "abs")]
    Absolute,
    #[serde(alias = "rel")]
    Relative,
}

/// Split a note name into step and alteration
///
/// `is` raises and `es` lowers by a semitone; `a` and `e` also take a bare
/// `s` as their first flat (`as`, `es`, `ases`, `eses`).
pub fn note_name_to_step(name: &str) -> Result<(Step, i32)> {
    let malformed = || Error::MalformedPitch(name.to_string());
    let mut chars = name.trim().chars();
    let step = chars
        .next()
        .and_then(Step::from_letter)
        .ok_or_else(malformed)?;

    let mut rest = chars.as_str();
    let mut alter = 0;
    if matches!(step, Step::A | Step::E) {
        if let Some(after) = rest.strip_prefix('s') {
            alter -= 1;
            rest = after;
        }
    }
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("is") {
            alter += 1;
            rest = after;
        } else if let Some(after) = rest.strip_prefix("es") {
            alter -= 1;
            rest = after;
        } else {
            return Err(malformed());
        }
    }

    Ok((step, alter))
}

/// Count an octave mark: `'` raises, `,` lowers
pub fn octave_marks(mark: &str) -> Result<i32> {
    mark.trim().chars().try_fold(0, |count, c| match c {
        '\'' => Ok(count + 1),
        ',' => Ok(count - 1),
        _ => Err(Error::MalformedPitch(mark.to_string())),
    })
}

/// Resolve an octave mark for `step`
///
/// Without a reference the mark is absolute (`c'` is C4). With one, the
/// octave is chosen relative to it and the mark shifts the result.
pub fn resolve_octave(mark: &str, step: Step, relative_to: Option<&Pitch>) -> Result<i32> {
    let marks = octave_marks(mark)?;
    Ok(match relative_to {
        Some(prev) => {
            let mut pitch = Pitch::new(step, 0, marks);
            pitch.make_absolute(prev);
            pitch.octave
        }
        None => marks + BASE_OCTAVE,
    })
}
