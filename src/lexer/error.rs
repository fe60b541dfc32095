//! Errors produced by the [lexer](super).

use super::token::Position;
use std::fmt;

/// A lexical error: an unterminated string, invalid escape, or stray
/// character, tagged with the source [`Position`] it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Where in the source the error occurred.
    pub position: Position,
    /// Human-readable reason.
    pub reason: String,
}

impl LexError {
    pub(crate) fn new(position: Position, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.reason)
    }
}

impl std::error::Error for LexError {}
