//! Duration arithmetic
//!
//! A duration is held as a base/scaling pair: `base` is the undotted value in
//! whole notes (a power of two, `1/4` for a quarter) and `scaling` collects
//! dots and `*n/d` multipliers. Tuplets are kept apart as an actual/normal
//! ratio (`3/2` for a triplet) because the exchange format renders them
//! separately from the note type.

use crate::error::{Error, Result};
use num_rational::Rational64;
use num_traits::{CheckedDiv, CheckedMul};
use serde::{Serialize, Serializer};

pub type Rational = Rational64;

/// Most dots accepted on a single duration
pub const MAX_DOTS: u8 = 8;

/// Duration values of the source notation, longest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationType {
    Maxima,
    Longa,
    Breve,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    OneTwentyEighth,
    TwoFiftySixth,
    FiveTwelfth,
    TenTwentyFourth,
    TwentyFortyEighth,
}

const TYPES: [DurationType; 15] = [
    DurationType::Maxima,
    DurationType::Longa,
    DurationType::Breve,
    DurationType::Whole,
    DurationType::Half,
    DurationType::Quarter,
    DurationType::Eighth,
    DurationType::Sixteenth,
    DurationType::ThirtySecond,
    DurationType::SixtyFourth,
    DurationType::OneTwentyEighth,
    DurationType::TwoFiftySixth,
    DurationType::FiveTwelfth,
    DurationType::TenTwentyFourth,
    DurationType::TwentyFortyEighth,
];

const TOKENS: [&str; 15] = [
    "\\maxima", "\\longa", "\\breve", "1", "2", "4", "8", "16", "32", "64", "128", "256", "512",
    "1024", "2048",
];

// 2048th has no MusicXML note type; it is kept so the value is not truncated.
const EXCHANGE_NAMES: [&str; 15] = [
    "maxima", "long", "breve", "whole", "half", "quarter", "eighth", "16th", "32nd", "64th",
    "128th", "256th", "512th", "1024th", "2048th",
];

impl DurationType {
    /// Look up a source duration token (`4`, `16`, `\breve`, `breve`)
    pub fn from_token(token: &str) -> Option<Self> {
        let bare = token.trim().trim_start_matches('\\');
        TOKENS
            .iter()
            .position(|t| t.trim_start_matches('\\') == bare)
            .map(|i| TYPES[i])
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Source token for this value
    pub fn token(self) -> &'static str {
        TOKENS[self.index()]
    }

    /// Note type name in the exchange format
    pub fn exchange_name(self) -> &'static str {
        EXCHANGE_NAMES[self.index()]
    }

    /// Whether the exchange format has a note type for this value
    pub fn is_exchange_supported(self) -> bool {
        self != DurationType::TwentyFortyEighth
    }

    /// Undotted length in whole notes (maxima = 8, quarter = 1/4)
    pub fn base(self) -> Rational {
        let i = self.index() as u32;
        if i <= 3 {
            Rational::from_integer(8 >> i)
        } else {
            Rational::new(1, 1 << (i - 3))
        }
    }

    /// Tremolo beam count when this value subdivides a note (eighth = 1)
    pub fn tremolo_marks(self) -> Option<u8> {
        match self.index() {
            i @ 6..=13 => Some((i - 5) as u8),
            _ => None,
        }
    }
}

impl Serialize for DurationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.exchange_name())
    }
}

/// Duration as a power-of-two base and a rational scaling factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaseScaling {
    pub base: Rational,
    pub scaling: Rational,
}

impl BaseScaling {
    pub fn new(base: Rational) -> Self {
        Self {
            base,
            scaling: Rational::from_integer(1),
        }
    }

    /// Length in quarter notes, with an optional actual/normal tuplet ratio
    ///
    /// `None` when the length does not fit the rational range.
    pub fn quarter_length(&self, tuplet: Option<Rational>) -> Option<Rational> {
        let scaled = match tuplet {
            Some(ratio) => apply_tuplet(*self, ratio)?,
            None => *self,
        };
        scaled
            .base
            .checked_mul(&scaled.scaling)?
            .checked_mul(&Rational::from_integer(4))
    }
}

/// A parsed duration token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDuration {
    pub kind: DurationType,
    pub dots: u8,
    /// Product of the `*n/d` multipliers
    pub factor: Rational,
}

impl ParsedDuration {
    pub fn base_scaling(&self) -> Option<BaseScaling> {
        scaled_base(self.kind, self.dots, self.factor)
    }
}

/// Base/scaling pair for a value with dots and a multiplier, if it fits
pub fn scaled_base(kind: DurationType, dots: u8, factor: Rational) -> Option<BaseScaling> {
    let mut bs = apply_dots(BaseScaling::new(kind.base()), dots)?;
    bs.scaling = bs.scaling.checked_mul(&factor)?;
    bs.quarter_length(None)?;
    Some(bs)
}

/// Parse `<value> '.'* ('*' n['/' d])*`
pub fn parse_duration(token: &str) -> Result<ParsedDuration> {
    let malformed = || Error::MalformedDuration(token.to_string());
    let trimmed = token.trim();
    let (head, scale) = match trimmed.find('*') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
        None => (trimmed, ""),
    };

    let value = head.trim_end_matches('.');
    let dots = u8::try_from(head.len() - value.len()).map_err(|_| malformed())?;
    if dots > MAX_DOTS {
        return Err(malformed());
    }
    let kind = DurationType::from_token(value).ok_or_else(malformed)?;
    let factor = if scale.is_empty() {
        Rational::from_integer(1)
    } else {
        parse_scaling(scale)?
    };

    let parsed = ParsedDuration { kind, dots, factor };
    parsed.base_scaling().ok_or_else(malformed)?;
    Ok(parsed)
}

/// Parse a multiplier suffix such as `*2/3` or `*4*3/2`
pub fn parse_scaling(scale: &str) -> Result<Rational> {
    let malformed = || Error::MalformedDuration(scale.to_string());
    let rest = scale.trim().strip_prefix('*').ok_or_else(malformed)?;
    let mut factor = Rational::from_integer(1);
    for item in rest.split('*') {
        let value: Rational = item.trim().parse().map_err(|_| malformed())?;
        if value <= Rational::from_integer(0) {
            return Err(malformed());
        }
        factor = factor.checked_mul(&value).ok_or_else(malformed)?;
    }
    Ok(factor)
}

/// Parse a tuplet fraction as written in the source (`2/3` = three in the
/// time of two) and return the actual/normal ratio (`3/2`)
pub fn parse_tuplet(fraction: &str) -> Result<Rational> {
    let value: Rational = fraction
        .trim()
        .parse()
        .map_err(|_| Error::MalformedTuplet(fraction.to_string()))?;
    if value <= Rational::from_integer(0) {
        return Err(Error::MalformedTuplet(fraction.to_string()));
    }
    Ok(value.recip())
}

/// `n` dots multiply the scaling by (2^(n+1) - 1) / 2^n
pub fn apply_dots(bs: BaseScaling, dots: u8) -> Option<BaseScaling> {
    let n = u32::from(dots.min(MAX_DOTS));
    let factor = Rational::new((1i64 << (n + 1)) - 1, 1i64 << n);
    Some(BaseScaling {
        base: bs.base,
        scaling: bs.scaling.checked_mul(&factor)?,
    })
}

/// Shrink the scaling by an actual/normal tuplet ratio
pub fn apply_tuplet(bs: BaseScaling, ratio: Rational) -> Option<BaseScaling> {
    Some(BaseScaling {
        base: bs.base,
        scaling: bs.scaling.checked_div(&ratio)?,
    })
}

/// Refine the tick resolution (ticks per quarter) so that the given duration
/// is a whole number of ticks
///
/// The result is always an integer multiple of `divisions`, so every
/// duration that fitted the old resolution still fits the new one. `None`
/// when the refined resolution overflows.
pub fn update_resolution(divisions: i64, bs: BaseScaling, tuplet: Option<Rational>) -> Option<i64> {
    let quarters = bs.quarter_length(tuplet)?;
    let ticks = quarters.checked_mul(&Rational::from_integer(divisions));
    match ticks {
        Some(ticks) if ticks.is_integer() => Some(divisions),
        _ => divisions.checked_mul(*quarters.denom()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d)
    }

    #[test]
    fn test_parse_plain_values() {
        let q = parse_duration("4").unwrap();
        assert_eq!(q.kind, DurationType::Quarter);
        assert_eq!(q.base_scaling(), Some(BaseScaling::new(r(1, 4))));

        let breve = parse_duration("\\breve").unwrap();
        assert_eq!(breve.kind, DurationType::Breve);
        assert_eq!(breve.base_scaling().unwrap().base, r(2, 1));
        assert_eq!(parse_duration("maxima").unwrap().kind.base(), r(8, 1));
        assert_eq!(parse_duration("2048").unwrap().kind.base(), r(1, 2048));
    }

    #[test]
    fn test_parse_dots_and_scaling() {
        let d = parse_duration("8..*2/3").unwrap();
        assert_eq!(d.kind, DurationType::Eighth);
        assert_eq!(d.dots, 2);
        let bs = d.base_scaling().unwrap();
        assert_eq!(bs.base, r(1, 8));
        assert_eq!(bs.scaling, r(7, 4) * r(2, 3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_duration("3"), Err(Error::MalformedDuration(_))));
        assert!(matches!(parse_duration("4*"), Err(Error::MalformedDuration(_))));
        assert!(matches!(parse_duration("4*0"), Err(Error::MalformedDuration(_))));
        assert!(matches!(parse_duration(""), Err(Error::MalformedDuration(_))));
    }

    #[test]
    fn test_parse_rejects_overflowing_factors() {
        let huge = "4*4611686018427387903*4611686018427387903";
        assert!(matches!(parse_duration(huge), Err(Error::MalformedDuration(_))));
        assert!(matches!(
            parse_scaling("*1/4611686018427387903*1/4611686018427387902"),
            Err(Error::MalformedDuration(_))
        ));
        // fits as a factor, but not once the quarter-note base is applied
        assert!(matches!(
            parse_duration("1024*1/4611686018427387903"),
            Err(Error::MalformedDuration(_))
        ));
    }

    #[test]
    fn test_apply_dots() {
        let q = BaseScaling::new(r(1, 4));
        assert_eq!(apply_dots(q, 0).unwrap().scaling, r(1, 1));
        assert_eq!(apply_dots(q, 1).unwrap().scaling, r(3, 2));
        assert_eq!(apply_dots(q, 3).unwrap().scaling, r(15, 8));
    }

    #[test]
    fn test_tuplet_fraction_is_inverted() {
        assert_eq!(parse_tuplet("2/3").unwrap(), r(3, 2));
        assert!(matches!(parse_tuplet("2/0"), Err(Error::MalformedTuplet(_))));
        assert!(matches!(parse_tuplet("abc"), Err(Error::MalformedTuplet(_))));
    }

    #[test]
    fn test_quarter_length() {
        let eighth = BaseScaling::new(r(1, 8));
        assert_eq!(eighth.quarter_length(None), Some(r(1, 2)));
        assert_eq!(eighth.quarter_length(Some(r(3, 2))), Some(r(1, 3)));
    }

    #[test]
    fn test_update_resolution() {
        let quarter = BaseScaling::new(r(1, 4));
        let eighth = BaseScaling::new(r(1, 8));
        let dotted = apply_dots(quarter, 1).unwrap();
        assert_eq!(update_resolution(1, quarter, None), Some(1));
        assert_eq!(update_resolution(1, eighth, None), Some(2));
        assert_eq!(update_resolution(2, eighth, Some(r(3, 2))), Some(6));
        assert_eq!(update_resolution(4, dotted, None), Some(4));
        assert_eq!(update_resolution(1, dotted, None), Some(2));
    }

    #[test]
    fn test_update_resolution_overflow() {
        let tiny = BaseScaling {
            base: r(1, 1),
            scaling: r(1, 4611686018427387903),
        };
        let divisions = update_resolution(1, tiny, None).unwrap();
        assert_eq!(divisions, 4611686018427387903);

        let other = BaseScaling {
            base: r(1, 1),
            scaling: r(1, 4611686018427387902),
        };
        assert_eq!(update_resolution(divisions, other, None), None);
    }

    #[test]
    fn test_resolution_is_monotonic_and_exact() {
        let script = [
            ("4", 0, None),
            ("8", 1, None),
            ("16", 0, Some(r(3, 2))),
            ("2", 2, None),
            ("32", 0, Some(r(5, 4))),
            ("4*2/3", 0, None),
        ];
        let mut divisions = 1;
        let mut seen = Vec::new();
        for (token, extra_dots, tuplet) in script {
            let parsed = parse_duration(token).unwrap();
            let bs = apply_dots(parsed.base_scaling().unwrap(), extra_dots).unwrap();
            let next = update_resolution(divisions, bs, tuplet).unwrap();
            assert!(next >= divisions);
            assert_eq!(next % divisions, 0);
            divisions = next;
            seen.push(bs.quarter_length(tuplet).unwrap());
            for q in &seen {
                assert!((*q * Rational::from_integer(divisions)).is_integer());
            }
        }
    }

    #[test]
    fn test_exchange_names() {
        assert_eq!(DurationType::Sixteenth.exchange_name(), "16th");
        assert_eq!(DurationType::Longa.exchange_name(), "long");
        assert_eq!(DurationType::Breve.token(), "\\breve");
        assert_eq!(DurationType::Sixteenth.token(), "16");
        assert!(!DurationType::TwentyFortyEighth.is_exchange_supported());
        assert!(DurationType::TenTwentyFourth.is_exchange_supported());
    }

    #[test]
    fn test_tremolo_marks() {
        assert_eq!(DurationType::Eighth.tremolo_marks(), Some(1));
        assert_eq!(DurationType::ThirtySecond.tremolo_marks(), Some(3));
        assert_eq!(DurationType::Quarter.tremolo_marks(), None);
    }
}
