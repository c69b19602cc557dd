#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed duration: '{0}'")]
    MalformedDuration(String),

    #[error("Unknown key: '{0}'")]
    UnknownKey(String),

    #[error("Unknown mode: '{0}'")]
    UnknownMode(String),

    #[error("Unknown clef: '{0}'")]
    UnknownClef(String),

    #[error("Malformed pitch: '{0}'")]
    MalformedPitch(String),

    #[error("Malformed time signature: '{0}'")]
    MalformedTime(String),

    #[error("Malformed tuplet fraction: '{0}'")]
    MalformedTuplet(String),

    #[error("Variable '{0}' referenced before it was defined")]
    UnresolvedSection(String),

    #[error("Score has no part and no section with music")]
    EmptyScore,

    #[error("'{0}' has no note or rest to apply to")]
    NoCurrentEvent(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line {line}, column {column}: {source}")]
    Located {
        line: usize,
        column: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a source location reported by the parser
    pub fn at(self, line: usize, column: usize) -> Self {
        match self {
            located @ Error::Located { .. } => located,
            other => Error::Located {
                line,
                column,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
