//! Score tree: Score -> Part -> Bar -> BarEvent
//!
//! Sections share the bar layout of parts but live outside the score; they
//! are named fragments spliced into parts by reference.

pub mod attributes;
pub mod note;

pub use attributes::{Attributes, Clef, ClefSign, KeySignature, Mode, TimeSignature};
pub use note::{Duration, Grace, Note, Rest, RestKind, RestPosition, Tie, Tuplet, TupletBracket};

use crate::error::Result;
use serde::Serialize;

/// Anything that can follow a bar's leading attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BarEvent {
    /// Attribute change applying to the next note or rest
    Attributes(Attributes),
    Note(Note),
    Rest(Rest),
}

impl BarEvent {
    pub fn is_note(&self) -> bool {
        matches!(self, BarEvent::Note(_))
    }
}

/// One bar: leading attributes, then notes, rests and attribute changes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bar {
    pub attributes: Attributes,
    pub events: Vec<BarEvent>,
}

impl Bar {
    pub fn new() -> Self {
        Self::default()
    }

    /// No note or rest yet
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn has_note(&self) -> bool {
        self.events.iter().any(BarEvent::is_note)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.events.iter().filter_map(|e| match e {
            BarEvent::Note(note) => Some(note),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub name: String,
    pub bars: Vec<Bar>,
}

impl Part {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bars: Vec::new(),
        }
    }
}

/// Named bar sequence bound to a source variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub bars: Vec<Bar>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bars: Vec::new(),
        }
    }

    /// Holds music rather than only attributes
    pub fn has_note(&self) -> bool {
        self.bars.iter().any(Bar::has_note)
    }
}

/// Finished score handed to the writer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Score {
    pub parts: Vec<Part>,
}

impl Score {
    /// Pretty-printed JSON snapshot of the tree
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
