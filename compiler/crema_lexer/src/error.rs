//! Lexer errors.

use std::fmt;

use crema_ir::Origin;
use thiserror::Error;

/// What went wrong while tokenizing.
///
/// `Default` is required by logos for the catch-all case where no token
/// pattern matches at the cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[default]
    #[error("Unrecognized token")]
    UnrecognizedToken,
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Malformed number literal")]
    InvalidNumber,
}

/// A fatal tokenization error with its source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub origin: Origin,
}

impl LexError {
    /// Full diagnostic text with the offending line and a caret.
    pub fn render(&self, source: &str) -> String {
        crema_diagnostic::render(&self.kind.to_string(), self.origin, source)
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crema_diagnostic::position_suffix(&self.kind.to_string(), self.origin))
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_carries_position_suffix() {
        let err = LexError {
            kind: LexErrorKind::UnterminatedString,
            origin: Origin::new(3, 7, 40),
        };
        assert_eq!(err.to_string(), "Unterminated string (3|7:40)");
    }

    #[test]
    fn render_points_at_the_column() {
        let src = "var s = 'oops\n";
        let err = LexError {
            kind: LexErrorKind::UnterminatedString,
            origin: Origin::new(1, 8, 8),
        };
        assert_eq!(
            err.render(src),
            "Unterminated string (1|8:8)\nvar s = 'oops\n--------^"
        );
    }
}
