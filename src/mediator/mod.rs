//! Mediator between the source parser and the score writer
//!
//! The parser calls one handler per construct it recognises, in source
//! order. The mediator turns those calls into a score tree and keeps the
//! state the source leaves implicit: the previous pitch for relative entry,
//! the running duration, pending ties and the tick resolution.

pub mod event;
pub mod state;

pub use event::Event;

use crate::config::MediatorConfig;
use crate::error::{Error, Result};
use crate::music::duration::{self, parse_duration, parse_scaling, parse_tuplet, DurationType};
use crate::music::pitch::{self, Pitch, PitchMode, BASE_OCTAVE, MIDDLE_C};
use crate::music::tables;
use crate::score::{
    Attributes, Bar, BarEvent, Clef, ClefSign, Duration, Grace, KeySignature, Mode, Note, Part,
    Rest, RestKind, RestPosition, Score, Section, Tie, TimeSignature, Tuplet, TupletBracket,
};
use log::{debug, warn};
use state::{Current, Cursor, DurationState, Target};

/// Incremental score builder driven by parser events
pub struct Mediator {
    /// Parts in score order
    parts: Vec<Part>,
    /// Named sections in declaration order
    sections: Vec<Section>,
    /// Part or section receiving new bars
    target: Option<Target>,
    /// Whether the last bar of the target still takes events
    bar_open: bool,
    /// Attribute changes waiting for the next note or rest of a started bar
    pending_attr: Attributes,
    /// Event the duration, tie and octave modifiers apply to
    current: Option<Current>,
    /// Last emitted pitch, reference for relative entry
    prev_pitch: Option<Pitch>,
    /// Duration for notes that omit one
    duration: DurationState,
    /// Ticks per quarter note
    divisions: i64,
    /// Previous note started a tie into the next one
    tied: bool,
    part_name: String,
    default_time: TimeSignature,
    default_clef: Clef,
}

impl Mediator {
    pub fn new() -> Self {
        Self::build(
            MediatorConfig::default().part_name,
            TimeSignature {
                beats: 4,
                beat_type: 4,
                common: true,
            },
            Clef::new(ClefSign::G, 2),
            DurationState::default(),
            1,
        )
    }

    /// Create a mediator with validated configuration
    pub fn with_config(config: MediatorConfig) -> Result<Self> {
        let default_time = TimeSignature::parse(&config.default_time, false)?;
        let default_clef = tables::clef(&config.default_clef)?;
        let malformed = || Error::MalformedDuration(config.initial_duration.clone());
        let parsed = parse_duration(&config.initial_duration)?;
        let duration = DurationState::from_parsed(parsed).ok_or_else(malformed)?;
        let divisions = duration::update_resolution(
            config.initial_divisions.max(1),
            duration.base_scaling(),
            None,
        )
        .ok_or_else(malformed)?;
        Ok(Self::build(
            config.part_name,
            default_time,
            default_clef,
            duration,
            divisions,
        ))
    }

    fn build(
        part_name: String,
        default_time: TimeSignature,
        default_clef: Clef,
        duration: DurationState,
        divisions: i64,
    ) -> Self {
        Self {
            parts: Vec::new(),
            sections: Vec::new(),
            target: None,
            bar_open: false,
            pending_attr: Attributes::new(),
            current: None,
            prev_pitch: None,
            duration,
            divisions,
            tied: false,
            part_name,
            default_time,
            default_clef,
        }
    }

    /// Current tick resolution
    pub fn divisions(&self) -> i64 {
        self.divisions
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Most recent section declared under `name`
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().rev().find(|s| s.name == name)
    }

    pub fn prev_pitch(&self) -> Option<Pitch> {
        self.prev_pitch
    }

    pub fn new_part(&mut self) {
        self.close_bar();
        self.parts.push(Part::new(&self.part_name));
        self.target = Some(Target::Part(self.parts.len() - 1));
        debug!("part {} opened", self.parts.len());
    }

    pub fn new_section(&mut self, name: &str) {
        self.close_bar();
        self.sections.push(Section::new(name));
        self.target = Some(Target::Section(self.sections.len() - 1));
        debug!("section '{}' opened", name);
    }

    /// Close the open bar; the next note, rest or attribute opens another
    pub fn new_bar(&mut self) {
        self.close_bar();
    }

    /// Insert the section bound to `name`
    ///
    /// A section with notes is copied bar for bar after the open bar. A
    /// section holding only attributes (a shared key or clef) merges its
    /// leading attributes into the open bar instead.
    pub fn fetch_variable(&mut self, name: &str) -> Result<()> {
        let section = self
            .sections
            .iter()
            .rev()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::UnresolvedSection(name.to_string()))?;

        if section.has_note() {
            let mut bars = section.bars.clone();
            debug!("splicing {} bars from '{}'", bars.len(), name);
            self.close_bar();
            let target = self.ensure_target();
            let target_bars = self.bars_mut(target);

            // A bar holding only attributes folds into the first spliced bar
            let head = match target_bars.last() {
                Some(last) if last.is_empty() => Some(last.attributes.clone()),
                _ => None,
            };
            if let Some(mut head) = head {
                target_bars.pop();
                if let Some(first) = bars.first_mut() {
                    head.merge(&first.attributes);
                    first.attributes = head;
                }
            }
            let start = target_bars.len();
            target_bars.extend(bars);

            // Modifiers after the reference apply to the spliced copy
            let cursor = (start..target_bars.len()).rev().find_map(|bar| {
                let event = target_bars[bar].events.len().checked_sub(1)?;
                Some(Current::Event(Cursor { target, bar, event }))
            });
            self.current = cursor;
        } else if let Some(first) = section.bars.first() {
            let attributes = first.attributes.clone();
            self.attributes_mut().merge(&attributes);
        }
        Ok(())
    }

    /// Finish the pass and hand over the score
    ///
    /// Without any declared part, the sections holding music are joined into
    /// one implicit part.
    pub fn finalize_score(mut self) -> Result<Score> {
        self.close_bar();
        let mut parts = std::mem::take(&mut self.parts);

        if parts.is_empty() {
            let bars: Vec<Bar> = self
                .sections
                .iter()
                .filter(|s| s.has_note())
                .flat_map(|s| s.bars.iter().cloned())
                .collect();
            if bars.is_empty() {
                return Err(Error::EmptyScore);
            }
            debug!("no part declared, joining {} section bars", bars.len());
            let mut part = Part::new(&self.part_name);
            part.bars = bars;
            parts.push(part);
        }

        for part in &mut parts {
            if part.bars.is_empty() {
                part.bars.push(Bar::new());
            }
            self.set_first_bar(part);
        }

        Ok(Score { parts })
    }

    /// Fill in the first bar's defaults and the final tick resolution
    pub fn set_first_bar(&self, part: &mut Part) {
        let Some(first) = part.bars.first_mut() else {
            return;
        };
        let head = &mut first.attributes;
        if head.time.is_none() {
            head.time = Some(self.default_time);
        }
        if head.clef.is_none() {
            head.clef = Some(self.default_clef);
        }
        head.divisions = Some(self.divisions);
    }


    pub fn set_key(&mut self, tonic: &str, mode: &str) -> Result<()> {
        let mode = Mode::from_token(mode)?;
        let fifths = tables::fifths(tonic, mode)?;
        self.attributes_mut().key = Some(KeySignature { fifths, mode });
        Ok(())
    }

    pub fn set_time(&mut self, fraction: &str, numeric: bool) -> Result<()> {
        let time = TimeSignature::parse(fraction, numeric)?;
        self.attributes_mut().time = Some(time);
        Ok(())
    }

    pub fn set_clef(&mut self, name: &str) -> Result<()> {
        let clef = tables::clef(name)?;
        self.attributes_mut().clef = Some(clef);
        Ok(())
    }

    pub fn set_barline(&mut self, token: &str) {
        if !tables::is_known_barline(token) {
            warn!("barline '{}' passed through untranslated", token);
        }
        let style = tables::barline_style(token).to_string();
        self.attributes_mut().barline = Some(style);
    }


    /// Set the reference pitch of a relative block
    pub fn set_relative(&mut self, note_name: &str) -> Result<()> {
        let (step, alter) = pitch::note_name_to_step(note_name)?;
        self.prev_pitch = Some(Pitch::new(step, alter, BASE_OCTAVE));
        self.current = Some(Current::Reference);
        Ok(())
    }

    pub fn new_note(&mut self, name: &str, mode: PitchMode) -> Result<()> {
        let (step, alter) = pitch::note_name_to_step(name)?;
        let mut pitch = Pitch::new(step, alter, BASE_OCTAVE);
        if mode == PitchMode::Relative {
            let reference = self.prev_pitch.unwrap_or_else(|| {
                debug!("relative note '{}' without reference, using middle C", name);
                MIDDLE_C
            });
            pitch.octave = pitch::resolve_octave("", step, Some(&reference))?;
        }

        let mut note = Note::new(pitch, self.duration.to_duration());
        if self.tied {
            note.tie = Tie::Stop;
            self.tied = false;
        }
        self.prev_pitch = Some(pitch);
        self.push_event(BarEvent::Note(note));
        Ok(())
    }

    pub fn new_rest(&mut self, kind: RestKind, pos: Option<RestPosition>) {
        let rest = Rest::new(kind, self.duration.to_duration(), pos);
        self.push_event(BarEvent::Rest(rest));
    }

    /// Turn the current note, entered as a rest position, into that rest
    pub fn note_to_rest(&mut self) -> Result<()> {
        let event = self
            .current_event_mut()
            .ok_or(Error::NoCurrentEvent("note_to_rest"))?;
        if let BarEvent::Note(note) = event {
            let rest = Rest::positioned(note);
            *event = BarEvent::Rest(rest);
        }
        Ok(())
    }

    /// Repeat the last bar, a whole-bar rest, until it spans `multiplier` bars
    pub fn scale_rest(&mut self, multiplier: u32, new_bar: bool) {
        self.close_bar();
        if let Some(target) = self.target {
            let bars = self.bars_mut(target);
            if let Some(last) = bars.last() {
                let mut copy = last.clone();
                copy.attributes = Attributes::new();
                for _ in 1..multiplier {
                    bars.push(copy.clone());
                }
            }
        }
        if new_bar {
            self.open_bar();
        }
    }

    /// Tie the current note to the next one
    pub fn tie_to_next(&mut self) -> Result<()> {
        if let Some(note) = self.current_note_mut("tie")? {
            note.tie = if note.tie == Tie::Stop {
                Tie::Continue
            } else {
                Tie::Start
            };
            self.tied = true;
        }
        Ok(())
    }


    pub fn new_duration(&mut self, token: &str) -> Result<()> {
        let parsed = parse_duration(token)?;
        if !parsed.kind.is_exchange_supported() {
            warn!(
                "duration '{}' has no {} note type in the exchange format",
                token,
                parsed.kind.exchange_name()
            );
        }
        let malformed = || Error::MalformedDuration(token.to_string());
        let state = DurationState::from_parsed(parsed).ok_or_else(malformed)?;
        self.retime(state).ok_or_else(malformed)
    }

    /// Apply a `*n/d` multiplier to the running duration
    pub fn scale_duration(&mut self, scale: &str) -> Result<()> {
        let malformed = || Error::MalformedDuration(scale.to_string());
        let factor = parse_scaling(scale)?;
        let state = self.duration.with_factor(factor).ok_or_else(malformed)?;
        self.retime(state).ok_or_else(malformed)
    }

    pub fn new_dot(&mut self) -> Result<()> {
        let state = self.duration.with_dot();
        match state.and_then(|state| self.retime(state)) {
            Some(()) => Ok(()),
            None => Err(Error::MalformedDuration(format!(
                "{}.",
                self.duration.token()
            ))),
        }
    }

    /// Put the current note or rest in a tuplet written as `fraction` (`2/3`)
    pub fn change_to_tuplet(&mut self, fraction: &str, bracket: TupletBracket) -> Result<()> {
        let ratio = parse_tuplet(fraction)?;
        let divisions = self.divisions;
        let duration = self
            .current_duration_mut()
            .ok_or(Error::NoCurrentEvent("tuplet"))?;
        let next = duration::update_resolution(divisions, duration.base_scaling, Some(ratio))
            .ok_or_else(|| Error::MalformedTuplet(fraction.to_string()))?;
        duration.tuplet = Some(Tuplet { ratio, bracket });
        self.set_divisions(next);
        Ok(())
    }

    pub fn new_grace(&mut self, slash: bool) -> Result<()> {
        if let Some(note) = self.current_note_mut("grace")? {
            note.grace = Some(Grace { slash });
        }
        Ok(())
    }

    /// Mark the current note as a tremolo subdivided in `duration` values
    pub fn new_tremolo(&mut self, duration: &str) -> Result<()> {
        let marks = DurationType::from_token(duration)
            .and_then(DurationType::tremolo_marks)
            .ok_or_else(|| Error::MalformedDuration(duration.to_string()))?;
        if let Some(note) = self.current_note_mut("tremolo")? {
            note.tremolo = Some(marks);
        }
        Ok(())
    }

    /// Apply an octave mark to the current note or relative reference
    ///
    /// A relative mark shifts the octave the note already resolved to.
    pub fn new_octave(&mut self, mark: &str, relative: bool) -> Result<()> {
        let resolved = match self.current {
            Some(Current::Reference) => {
                let mut reference = self.prev_pitch.unwrap_or(MIDDLE_C);
                reference.octave =
                    pitch::resolve_octave(mark, reference.step, relative.then_some(&reference))?;
                Some(reference)
            }
            _ => match self.current_note_mut("octave")? {
                Some(note) => {
                    let before = note.pitch;
                    note.pitch.octave =
                        pitch::resolve_octave(mark, before.step, relative.then_some(&before))?;
                    Some(note.pitch)
                }
                None => None,
            },
        };
        if resolved.is_some() {
            self.prev_pitch = resolved;
        }
        Ok(())
    }


    fn ensure_target(&mut self) -> Target {
        match self.target {
            Some(target) => target,
            None => {
                debug!("music outside any part or section, opening an implicit part");
                self.new_part();
                Target::Part(self.parts.len() - 1)
            }
        }
    }

    fn bars_mut(&mut self, target: Target) -> &mut Vec<Bar> {
        match target {
            Target::Part(i) => &mut self.parts[i].bars,
            Target::Section(i) => &mut self.sections[i].bars,
        }
    }

    /// Open a bar if none is open; returns its location
    fn open_bar(&mut self) -> (Target, usize) {
        let target = self.ensure_target();
        let open = self.bar_open;
        let bars = self.bars_mut(target);
        if !open || bars.is_empty() {
            bars.push(Bar::new());
        }
        self.bar_open = true;
        (target, self.bars_mut(target).len() - 1)
    }

    /// Attributes that the next attribute change lands in
    ///
    /// Until the bar holds a note or rest that is the bar's leading set;
    /// afterwards it is the set pending for the next note or rest.
    fn attributes_mut(&mut self) -> &mut Attributes {
        let (target, index) = self.open_bar();
        let Self {
            parts,
            sections,
            pending_attr,
            ..
        } = self;
        let bar = match target {
            Target::Part(i) => &mut parts[i].bars[index],
            Target::Section(i) => &mut sections[i].bars[index],
        };
        if bar.is_empty() {
            &mut bar.attributes
        } else {
            pending_attr
        }
    }

    fn push_event(&mut self, event: BarEvent) {
        let (target, bar) = self.open_bar();
        let pending = std::mem::take(&mut self.pending_attr);
        let events = &mut self.bars_mut(target)[bar].events;
        if pending.has_attr() {
            events.push(BarEvent::Attributes(pending));
        }
        events.push(event);
        let index = events.len() - 1;
        self.current = Some(Current::Event(Cursor {
            target,
            bar,
            event: index,
        }));
    }

    /// Flush pending attributes to the end of the open bar and close it
    fn close_bar(&mut self) {
        let pending = std::mem::take(&mut self.pending_attr);
        if let (true, Some(target)) = (self.bar_open, self.target) {
            if pending.has_attr() {
                if let Some(bar) = self.bars_mut(target).last_mut() {
                    bar.events.push(BarEvent::Attributes(pending));
                }
            }
        }
        self.bar_open = false;
    }

    fn current_event_mut(&mut self) -> Option<&mut BarEvent> {
        let Some(Current::Event(cursor)) = self.current else {
            return None;
        };
        self.bars_mut(cursor.target)
            .get_mut(cursor.bar)?
            .events
            .get_mut(cursor.event)
    }

    fn current_duration_mut(&mut self) -> Option<&mut Duration> {
        match self.current_event_mut()? {
            BarEvent::Note(note) => Some(&mut note.duration),
            BarEvent::Rest(rest) => Some(&mut rest.duration),
            BarEvent::Attributes(_) => None,
        }
    }

    /// Current note; `Ok(None)` when the current event is a rest
    fn current_note_mut(&mut self, modifier: &'static str) -> Result<Option<&mut Note>> {
        match self.current_event_mut() {
            Some(BarEvent::Note(note)) => Ok(Some(note)),
            Some(_) => Ok(None),
            None => Err(Error::NoCurrentEvent(modifier)),
        }
    }

    /// Make `state` the running duration, rewrite the current event with it
    /// and refine the resolution
    ///
    /// Nothing changes when the refined resolution would overflow.
    fn retime(&mut self, state: DurationState) -> Option<()> {
        let bs = state.base_scaling();
        let tuplet = self
            .current_duration_mut()
            .and_then(|duration| duration.tuplet)
            .map(|t| t.ratio);
        let mut next = duration::update_resolution(self.divisions, bs, None)?;
        if tuplet.is_some() {
            next = duration::update_resolution(next, bs, tuplet)?;
        }

        if let Some(duration) = self.current_duration_mut() {
            state.apply_to(duration);
        }
        self.duration = state;
        self.set_divisions(next);
        Some(())
    }

    fn set_divisions(&mut self, next: i64) {
        if next != self.divisions {
            debug!("divisions {} -> {}", self.divisions, next);
            self.divisions = next;
        }
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new()
    }
}
