//! Mediator configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Defaults the mediator falls back on when the source leaves them implicit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Name given to every part
    pub part_name: String,
    /// Time signature for a first bar that declares none
    pub default_time: String,
    /// Clef for a first bar that declares none
    pub default_clef: String,
    /// Duration of notes entered before any explicit duration
    pub initial_duration: String,
    /// Starting tick resolution
    pub initial_divisions: i64,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            part_name: "Part 1".to_string(),
            default_time: "4/4".to_string(),
            default_clef: "treble".to_string(),
            initial_duration: "4".to_string(),
            initial_divisions: 1,
        }
    }
}

impl MediatorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
