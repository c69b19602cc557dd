//! Translation tables from source vocabulary to exchange-format values

use crate::error::{Error, Result};
use crate::score::attributes::{Clef, ClefSign, Mode};

/// Major keys by ascending sharps
const SHARP_KEYS: [&str; 11] = [
    "c", "g", "d", "a", "e", "b", "fis", "cis", "gis", "dis", "ais",
];

/// Major keys by ascending flats
const FLAT_KEYS: [&str; 7] = ["c", "f", "bes", "es", "as", "des", "ges"];

const CLEFS: [(&str, Clef); 4] = [
    ("treble", Clef::new(ClefSign::G, 2)),
    ("bass", Clef::new(ClefSign::F, 4)),
    ("alto", Clef::new(ClefSign::C, 3)),
    ("tenor", Clef::new(ClefSign::C, 4)),
];

const BARLINES: [(&str, &str); 9] = [
    ("|", "regular"),
    (":", "dotted"),
    ("dashed", "dashed"),
    (".", "heavy"),
    ("||", "light-light"),
    (".|", "heavy-light"),
    (".|.", "heavy-heavy"),
    ("|.", "light-heavy"),
    ("'", "tick"),
];

/// Circle-of-fifths position of a key
pub fn fifths(tonic: &str, mode: Mode) -> Result<i32> {
    let tonic = tonic.trim();
    let major = if let Some(sharps) = SHARP_KEYS.iter().position(|k| *k == tonic) {
        sharps as i32
    } else if let Some(flats) = FLAT_KEYS.iter().position(|k| *k == tonic) {
        -(flats as i32)
    } else {
        return Err(Error::UnknownKey(tonic.to_string()));
    };
    Ok(major + mode.fifths_offset())
}

pub fn clef(name: &str) -> Result<Clef> {
    let name = name.trim();
    CLEFS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, clef)| *clef)
        .ok_or_else(|| Error::UnknownClef(name.to_string()))
}

/// Barline style for a source token; unknown tokens are already style words
pub fn barline_style(token: &str) -> &str {
    match BARLINES.iter().find(|(t, _)| *t == token) {
        Some((_, style)) => style,
        None => token,
    }
}

/// Whether `token` is in the barline table
pub fn is_known_barline(token: &str) -> bool {
    BARLINES.iter().any(|(t, _)| *t == token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifths() {
        assert_eq!(fifths("g", Mode::Major).unwrap(), 1);
        assert_eq!(fifths("g", Mode::Minor).unwrap(), -2);
        assert_eq!(fifths("c", Mode::Major).unwrap(), 0);
        assert_eq!(fifths("a", Mode::Minor).unwrap(), 0);
        assert_eq!(fifths("bes", Mode::Major).unwrap(), -2);
        assert_eq!(fifths("ges", Mode::Major).unwrap(), -6);
        assert_eq!(fifths("gis", Mode::Minor).unwrap(), 5);
        assert_eq!(fifths("d", Mode::Dorian).unwrap(), 0);
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(fifths("h", Mode::Major), Err(Error::UnknownKey(k)) if k == "h"));
        assert!(matches!(fifths("fes", Mode::Major), Err(Error::UnknownKey(_))));
    }

    #[test]
    fn test_clefs() {
        assert_eq!(clef("treble").unwrap(), Clef::new(ClefSign::G, 2));
        assert_eq!(clef("bass").unwrap(), Clef::new(ClefSign::F, 4));
        assert_eq!(clef("alto").unwrap(), Clef::new(ClefSign::C, 3));
        assert_eq!(clef("tenor").unwrap(), Clef::new(ClefSign::C, 4));
        assert!(matches!(clef("soprano"), Err(Error::UnknownClef(_))));
    }

    #[test]
    fn test_barlines() {
        assert_eq!(barline_style("|."), "light-heavy");
        assert_eq!(barline_style("||"), "light-light");
        assert_eq!(barline_style("'"), "tick");
        assert_eq!(barline_style("none"), "none");
        assert!(!is_known_barline("none"));
    }
}
