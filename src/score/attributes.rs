//! Bar attributes: key, time, clef, divisions and barline

use crate::error::{Error, Result};
use serde::Serialize;

/// Clef sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClefSign {
    G,
    F,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Clef {
    pub sign: ClefSign,
    /// Staff line the sign sits on, counted from the bottom
    pub line: u8,
}

impl Clef {
    pub const fn new(sign: ClefSign, line: u8) -> Self {
        Self { sign, line }
    }
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    /// Parse a mode keyword, with or without the source's leading backslash
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim().trim_start_matches('\\') {
            "major" => Ok(Mode::Major),
            "minor" => Ok(Mode::Minor),
            "ionian" => Ok(Mode::Ionian),
            "dorian" => Ok(Mode::Dorian),
            "phrygian" => Ok(Mode::Phrygian),
            "lydian" => Ok(Mode::Lydian),
            "mixolydian" => Ok(Mode::Mixolydian),
            "aeolian" => Ok(Mode::Aeolian),
            "locrian" => Ok(Mode::Locrian),
            _ => Err(Error::UnknownMode(token.to_string())),
        }
    }

    /// Fifths to add to the major key on the same tonic
    pub fn fifths_offset(self) -> i32 {
        match self {
            Mode::Major | Mode::Ionian => 0,
            Mode::Lydian => 1,
            Mode::Mixolydian => -1,
            Mode::Dorian => -2,
            Mode::Minor | Mode::Aeolian => -3,
            Mode::Phrygian => -4,
            Mode::Locrian => -5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeySignature {
    /// Sharps (positive) or flats (negative) on the circle of fifths
    pub fifths: i32,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
    /// Rendered with the common/cut time glyph
    pub common: bool,
}

impl TimeSignature {
    /// Parse `n/d`; 4/4 and 2/2 use the glyph unless `numeric` is requested
    pub fn parse(fraction: &str, numeric: bool) -> Result<Self> {
        let malformed = || Error::MalformedTime(fraction.to_string());
        let (beats, beat_type) = fraction.trim().split_once('/').ok_or_else(malformed)?;
        let beats: u32 = beats.trim().parse().map_err(|_| malformed())?;
        let beat_type: u32 = beat_type.trim().parse().map_err(|_| malformed())?;
        if beats == 0 || beat_type == 0 {
            return Err(malformed());
        }
        let common = !numeric && matches!((beats, beat_type), (4, 4) | (2, 2));
        Ok(Self {
            beats,
            beat_type,
            common,
        })
    }
}

/// Attribute set attached to a bar or to the note that follows it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeySignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clef: Option<Clef>,
    /// Ticks per quarter note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisions: Option<i64>,
    /// Barline style keyword
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barline: Option<String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_attr(&self) -> bool {
        self.key.is_some()
            || self.time.is_some()
            || self.clef.is_some()
            || self.divisions.is_some()
            || self.barline.is_some()
    }

    /// Overlay every attribute set in `other`
    pub fn merge(&mut self, other: &Attributes) {
        if other.key.is_some() {
            self.key = other.key;
        }
        if other.time.is_some() {
            self.time = other.time;
        }
        if other.clef.is_some() {
            self.clef = other.clef;
        }
        if other.divisions.is_some() {
            self.divisions = other.divisions;
        }
        if other.barline.is_some() {
            self.barline.clone_from(&other.barline);
        }
    }
}
