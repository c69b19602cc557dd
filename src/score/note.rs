//! Notes, rests and their durations

use crate::music::duration::{BaseScaling, DurationType, Rational};
use num_traits::CheckedMul;
use crate::music::pitch::{Pitch, Step};
use serde::{Deserialize, Serialize};

/// Written duration of a note or rest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Duration {
    #[serde(rename = "type")]
    pub kind: DurationType,
    pub dots: u8,
    /// Base value and scaling, dots included, tuplet excluded
    #[serde(flatten)]
    pub base_scaling: BaseScaling,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuplet: Option<Tuplet>,
}

impl Duration {
    /// Length in quarter notes, tuplet applied
    pub fn quarter_length(&self) -> Option<Rational> {
        self.base_scaling
            .quarter_length(self.tuplet.as_ref().map(|t| t.ratio))
    }

    /// Length in ticks at the given resolution, if it is a whole number
    pub fn ticks(&self, divisions: i64) -> Option<i64> {
        let ticks = self
            .quarter_length()?
            .checked_mul(&Rational::from_integer(divisions))?;
        ticks.is_integer().then(|| ticks.to_integer())
    }
}

/// Position of a note within a tuplet bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TupletBracket {
    Start,
    #[default]
    Middle,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tuplet {
    /// Actual notes over normal notes (3/2 for a triplet)
    pub ratio: Rational,
    pub bracket: TupletBracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tie {
    #[default]
    None,
    Start,
    Stop,
    /// Closes the incoming tie and opens the next one
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grace {
    pub slash: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub pitch: Pitch,
    pub duration: Duration,
    pub tie: Tie,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace: Option<Grace>,
    /// Tremolo beam count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremolo: Option<u8>,
}

impl Note {
    pub fn new(pitch: Pitch, duration: Duration) -> Self {
        Self {
            pitch,
            duration,
            tie: Tie::None,
            grace: None,
            tremolo: None,
        }
    }
}

/// Source rest kinds, also accepted as their tokens `r`, `R` and `s`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestKind {
    #[default]
    #[serde(alias = "r")]
    Rest,
    /// Whole-bar rest drawn as a single glyph
    #[serde(alias = "R")]
    MultiMeasure,
    /// Invisible spacer
    #[serde(alias = "s")]
    Skip,
}

/// Staff position a rest was placed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestPosition {
    pub step: Step,
    pub octave: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rest {
    pub duration: Duration,
    /// False for a whole-bar rest, whose glyph ignores the written type
    pub show_type: bool,
    pub skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<RestPosition>,
}

impl Rest {
    pub fn new(kind: RestKind, duration: Duration, pos: Option<RestPosition>) -> Self {
        Self {
            duration,
            show_type: kind != RestKind::MultiMeasure,
            skip: kind == RestKind::Skip,
            pos,
        }
    }

    /// Rest standing where `note` was entered as a position placeholder
    pub fn positioned(note: &Note) -> Self {
        Self::new(
            RestKind::Rest,
            note.duration.clone(),
            Some(RestPosition {
                step: note.pitch.step,
                octave: note.pitch.octave,
            }),
        )
    }

    /// Note type to print, if any
    pub fn display_type(&self) -> Option<DurationType> {
        self.show_type.then_some(self.duration.kind)
    }
}
