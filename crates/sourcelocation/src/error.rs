use crate::Location;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceLocationError>;

/// Which side of a hunk a line count refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkSide {
    Old,
    New,
}

impl std::fmt::Display for HunkSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// Every variant is an invalid argument: some invariant of the value being
/// built would not hold. Nothing is ever partially constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceLocationError {
    #[error("Invalid line number {0}: lines are one-indexed")]
    InvalidLine(usize),

    #[error("Invalid range: start {start} is after stop {stop}")]
    InvalidRange { start: Location, stop: Location },

    #[error("Filename must not be empty")]
    EmptyFilename,

    #[error("Hunk declares {declared} {side} lines but has {actual}")]
    HunkLineCount {
        side: HunkSide,
        declared: usize,
        actual: usize,
    },

    #[error("Hunk's {side} side of {count} lines starting at {start} runs past the last line")]
    HunkOutOfRange {
        side: HunkSide,
        start: usize,
        count: usize,
    },

    #[error("Hunk for {found} does not belong to {expected}")]
    MismatchedFilenames { expected: String, found: String },

    #[error("A file diff needs at least one hunk")]
    NoHunks,

    #[error("Length of multi-line range {0} requires line lengths")]
    MultiLineLength(String),

    #[error("Location {location} precedes origin {origin}")]
    PrecedesOrigin { location: Location, origin: Location },

    #[error("Parse error in {kind}: {message}")]
    Parse { kind: &'static str, message: String },
}

impl SourceLocationError {
    pub(crate) fn parse(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            kind,
            message: message.into(),
        }
    }
}
