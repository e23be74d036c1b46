//! Front end error types.

use thiserror::Error;

/// The source could not be split into tokens.
///
/// Positions use 1-indexed lines and 0-indexed columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TokenizeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl TokenizeError {
    /// Creates a new tokenize error at the given position.
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// The token stream could not be parsed into a syntax tree.
///
/// Positions are both 1-indexed. `text` holds the offending physical line,
/// terminator included, when it is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub text: Option<String>,
}

impl ParseError {
    /// Creates a new parse error without source text.
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            text: None,
        }
    }

    /// Attaches the offending physical line.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}
