//! Error types for the parser
//!
//! The lexer is total and has no error type: unrecognized input degrades to
//! `Unknown` tokens. Everything that can go wrong is reported as a [`ParseError`].

use serde::Serialize;
use thiserror::Error;

use crate::lexer::Token;

/// Source location information for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A malformed construct, located at the offending token
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("ParseError: {message} at {location}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        ParseError {
            message: message.into(),
            location: SourceLocation { line, column },
        }
    }

    /// Error positioned at the start of `token`
    pub fn at(message: impl Into<String>, token: &Token) -> Self {
        Self::new(message, token.span.line, token.span.column)
    }

    pub fn line(&self) -> u32 {
        self.location.line
    }

    pub fn column(&self) -> u32 {
        self.location.column
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
