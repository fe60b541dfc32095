//! Errors produced by the [parser](super).

use crate::lexer::Position;
use std::fmt;

/// A parse error: the parser expected one thing and found another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub position: Position,
    pub expected: String,
    pub got: String,
}

impl ParseError {
    pub(crate) fn new(position: Position, expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self {
            position,
            expected: expected.into(),
            got: got.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.position, self.expected, self.got)
    }
}

impl std::error::Error for ParseError {}

/// All diagnostics collected by a single [`super::Parser::parse`] call.
/// The parser recovers at statement/block boundaries, so more than one
/// error may be surfaced from a single source file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} parse error(s): {}", .0.len(), summarize(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn summarize(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
