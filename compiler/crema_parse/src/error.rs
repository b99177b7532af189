//! Parse errors.
//!
//! All parse errors are fatal to the enclosing source unit; there is no
//! recovery or resynchronization.

use std::fmt;

use crema_ir::Origin;
use crema_lexer::{LexError, LexErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Tokenization failed before parsing started.
    #[error("{0}")]
    Lex(LexErrorKind),
    /// An `expect()` was not met. `got` is the offending token rendered
    /// as `kind:value`, or `EOF`.
    #[error("Expected {wanted}, got {got}")]
    Expected { wanted: String, got: String },
    #[error("Not an l-value")]
    NotAnLvalue,
    #[error("Duplicate else case")]
    DuplicateElseCase,
    #[error("Unexpected token {0}")]
    UnexpectedToken(String),
}

/// A fatal parse error with its source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub origin: Origin,
}

impl ParseError {
    pub(crate) fn from_lex(err: LexError) -> Self {
        ParseError {
            kind: ParseErrorKind::Lex(err.kind),
            origin: err.origin,
        }
    }

    /// Full diagnostic text with the offending line and a caret.
    pub fn render(&self, source: &str) -> String {
        crema_diagnostic::render(&self.kind.to_string(), self.origin, source)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crema_diagnostic::position_suffix(&self.kind.to_string(), self.origin))
    }
}

impl std::error::Error for ParseError {}
