//! Content-free descriptions of JSON decode failures

use serde_json::error::Category;
use std::fmt;

/// Where and how a JSON document failed to decode.
///
/// `serde_json` messages quote the offending value ("invalid type: string
/// \"...\""), which for secret documents is the secret itself. This keeps
/// only the error category and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailure {
    category: Category,
    line: usize,
    column: usize,
}

impl DecodeFailure {
    /// Error category reported by `serde_json`
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// One-based line of the failure
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// One-based column of the failure
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }
}

impl From<&serde_json::Error> for DecodeFailure {
    fn from(error: &serde_json::Error) -> Self {
        Self {
            category: error.classify(),
            line: error.line(),
            column: error.column(),
        }
    }
}

impl From<serde_json::Error> for DecodeFailure {
    fn from(error: serde_json::Error) -> Self {
        Self::from(&error)
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.category {
            Category::Io => "I/O error",
            Category::Syntax => "malformed JSON",
            Category::Data => "unexpected structure",
            Category::Eof => "unexpected end of input",
        };
        write!(f, "{kind} at line {} column {}", self.line, self.column)
    }
}

impl std::error::Error for DecodeFailure {}
