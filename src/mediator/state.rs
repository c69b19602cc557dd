//! Running state of a build pass

use crate::music::duration::{
    scaled_base, BaseScaling, DurationType, ParsedDuration, Rational, MAX_DOTS,
};
use crate::score::note::Duration;

/// Where new bars go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Part(usize),
    Section(usize),
}

/// Location of an event inside the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub target: Target,
    pub bar: usize,
    pub event: usize,
}

/// What duration, tuplet and octave modifiers apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Current {
    /// Reference pitch of a relative block; nothing was emitted
    Reference,
    Event(Cursor),
}

/// Duration carried over to notes that omit one
///
/// Only built through checked constructors, so its length always fits the
/// rational range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationState {
    kind: DurationType,
    dots: u8,
    /// Product of `*n/d` multipliers
    factor: Rational,
    base_scaling: BaseScaling,
}

impl DurationState {
    pub fn new(kind: DurationType, dots: u8, factor: Rational) -> Option<Self> {
        let base_scaling = scaled_base(kind, dots, factor)?;
        Some(Self {
            kind,
            dots,
            factor,
            base_scaling,
        })
    }

    pub fn from_parsed(parsed: ParsedDuration) -> Option<Self> {
        Self::new(parsed.kind, parsed.dots, parsed.factor)
    }

    pub fn kind(&self) -> DurationType {
        self.kind
    }

    pub fn base_scaling(&self) -> BaseScaling {
        self.base_scaling
    }

    pub fn with_dot(&self) -> Option<Self> {
        Self::new(self.kind, (self.dots + 1).min(MAX_DOTS), self.factor)
    }

    pub fn with_factor(&self, factor: Rational) -> Option<Self> {
        Self::new(self.kind, self.dots, factor)
    }

    /// Source spelling, e.g. `8..*2/3`
    pub fn token(&self) -> String {
        let mut token = format!("{}{}", self.kind.token(), ".".repeat(usize::from(self.dots)));
        if self.factor != Rational::from_integer(1) {
            token.push_str(&format!("*{}", self.factor));
        }
        token
    }

    /// Duration for a new event, outside any tuplet
    pub fn to_duration(&self) -> Duration {
        Duration {
            kind: self.kind,
            dots: self.dots,
            base_scaling: self.base_scaling,
            tuplet: None,
        }
    }

    /// Rewrite an existing duration, keeping its tuplet
    pub fn apply_to(&self, duration: &mut Duration) {
        duration.kind = self.kind;
        duration.dots = self.dots;
        duration.base_scaling = self.base_scaling;
    }
}

impl Default for DurationState {
    fn default() -> Self {
        Self {
            kind: DurationType::Quarter,
            dots: 0,
            factor: Rational::from_integer(1),
            base_scaling: BaseScaling::new(DurationType::Quarter.base()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::duration::parse_duration;

    fn state(token: &str) -> DurationState {
        DurationState::from_parsed(parse_duration(token).unwrap()).unwrap()
    }

    #[test]
    fn test_dots_are_carried() {
        let dotted = state("4").with_dot().unwrap();
        let duration = dotted.to_duration();
        assert_eq!(duration.dots, 1);
        assert_eq!(duration.base_scaling.scaling, Rational::new(3, 2));
        assert_eq!(dotted.token(), "4.");
    }

    #[test]
    fn test_apply_keeps_factor() {
        let eighth = state("8*2/3");
        let mut duration = state("1").to_duration();
        eighth.apply_to(&mut duration);
        assert_eq!(duration.kind, DurationType::Eighth);
        assert_eq!(duration.quarter_length(), Some(Rational::new(1, 3)));
        assert_eq!(eighth.token(), "8*2/3");
    }

    #[test]
    fn test_default_is_plain_quarter() {
        assert_eq!(DurationState::default(), state("4"));
    }

    #[test]
    fn test_dot_on_extreme_factor_is_rejected() {
        let tight = DurationState::new(
            DurationType::Whole,
            0,
            Rational::new(1, 4611686018427387905),
        )
        .unwrap();
        assert_eq!(tight.with_dot(), None);
    }
}
