//! Parser events and their dispatch onto the mediator

use super::Mediator;
use crate::error::Result;
use crate::music::pitch::PitchMode;
use crate::score::{RestKind, RestPosition, Score, TupletBracket};
use log::trace;
use serde::{Deserialize, Serialize};

/// One recognised source construct, as reported by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Part,
    Section {
        name: String,
    },
    Bar,
    /// Reference to a previously assigned variable
    Variable {
        name: String,
    },
    Key {
        tonic: String,
        mode: String,
    },
    Time {
        fraction: String,
        #[serde(default)]
        numeric: bool,
    },
    Clef {
        name: String,
    },
    Barline {
        token: String,
    },
    /// Start of a relative block with its reference note
    Relative {
        note: String,
    },
    Note {
        name: String,
        #[serde(default)]
        mode: PitchMode,
    },
    Rest {
        #[serde(default)]
        kind: RestKind,
        #[serde(default)]
        pos: Option<RestPosition>,
    },
    /// Pitched rest marker following a note
    NoteToRest,
    ScaleRest {
        multiplier: u32,
        #[serde(default)]
        new_bar: bool,
    },
    Duration {
        token: String,
    },
    ScaleDuration {
        scale: String,
    },
    Dot,
    Tuplet {
        fraction: String,
        #[serde(default)]
        bracket: TupletBracket,
    },
    Grace {
        #[serde(default)]
        slash: bool,
    },
    Tremolo {
        duration: String,
    },
    Octave {
        mark: String,
        #[serde(default)]
        relative: bool,
    },
    Tie,
}

impl Event {
    /// Parse a JSON array of events
    pub fn parse_stream(text: &str) -> Result<Vec<Event>> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Mediator {
    /// Dispatch one event to its handler
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        trace!("{:?}", event);
        match event {
            Event::Part => self.new_part(),
            Event::Section { name } => self.new_section(name),
            Event::Bar => self.new_bar(),
            Event::Variable { name } => self.fetch_variable(name)?,
            Event::Key { tonic, mode } => self.set_key(tonic, mode)?,
            Event::Time { fraction, numeric } => self.set_time(fraction, *numeric)?,
            Event::Clef { name } => self.set_clef(name)?,
            Event::Barline { token } => self.set_barline(token),
            Event::Relative { note } => self.set_relative(note)?,
            Event::Note { name, mode } => self.new_note(name, *mode)?,
            Event::Rest { kind, pos } => self.new_rest(*kind, *pos),
            Event::NoteToRest => self.note_to_rest()?,
            Event::ScaleRest {
                multiplier,
                new_bar,
            } => self.scale_rest(*multiplier, *new_bar),
            Event::Duration { token } => self.new_duration(token)?,
            Event::ScaleDuration { scale } => self.scale_duration(scale)?,
            Event::Dot => self.new_dot()?,
            Event::Tuplet { fraction, bracket } => self.change_to_tuplet(fraction, *bracket)?,
            Event::Grace { slash } => self.new_grace(*slash)?,
            Event::Tremolo { duration } => self.new_tremolo(duration)?,
            Event::Octave { mark, relative } => self.new_octave(mark, *relative)?,
            Event::Tie => self.tie_to_next()?,
        }
        Ok(())
    }

    /// Like `apply`, tagging any error with the source position
    pub fn apply_at(&mut self, event: &Event, line: usize, column: usize) -> Result<()> {
        self.apply(event).map_err(|e| e.at(line, column))
    }

    /// Apply events in order, stopping at the first error
    pub fn feed<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }

    /// Feed a whole event stream and finalize the score
    pub fn run<'a, I>(mut self, events: I) -> Result<Score>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        self.feed(events)?;
        self.finalize_score()
    }
}
