//! Token cursor: single-token lookahead over the lexed stream.

use crema_ir::Origin;
use crema_lexer::{Kw, Token, TokenKind};

use crate::error::{ParseError, ParseErrorKind};

pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    /// Position just past the last byte of input, for `got EOF` errors.
    eof: Origin,
}

impl Cursor {
    pub(crate) fn new(tokens: Vec<Token>, eof: Origin) -> Self {
        Cursor { tokens, pos: 0, eof }
    }

    #[inline]
    pub(crate) fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Origin of the current token, or the end-of-input position.
    pub(crate) fn origin(&self) -> Origin {
        self.current().map_or(self.eof, |t| t.origin)
    }

    /// The current token rendered as `kind:value`, or `EOF`.
    pub(crate) fn describe(&self) -> String {
        self.current()
            .map_or_else(|| "EOF".to_owned(), |t| t.kind.to_string())
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consume and return the current token.
    pub(crate) fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn at_punct(&self, p: &'static str) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Punct(p))
    }

    pub(crate) fn at_kw(&self, kw: Kw) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Kw(kw))
    }

    pub(crate) fn maybe_punct(&mut self, p: &'static str) -> bool {
        let hit = self.at_punct(p);
        if hit {
            self.advance();
        }
        hit
    }

    pub(crate) fn maybe_kw(&mut self, kw: Kw) -> bool {
        let hit = self.at_kw(kw);
        if hit {
            self.advance();
        }
        hit
    }

    /// Consume a plain `=` (never a fused compound assignment).
    pub(crate) fn maybe_assign(&mut self) -> bool {
        let hit = matches!(self.current(), Some(t) if t.kind == TokenKind::Assign(None));
        if hit {
            self.advance();
        }
        hit
    }

    pub(crate) fn maybe_ident(&mut self) -> Option<(String, Origin)> {
        if let Some(Token { kind: TokenKind::Ident(name), origin }) = self.current() {
            let out = (name.clone(), *origin);
            self.advance();
            return Some(out);
        }
        None
    }

    pub(crate) fn expect_punct(&mut self, p: &'static str) -> Result<(), ParseError> {
        if self.maybe_punct(p) {
            Ok(())
        } else {
            Err(self.expected(p))
        }
    }

    pub(crate) fn expect_kw(&mut self, kw: Kw) -> Result<(), ParseError> {
        if self.maybe_kw(kw) {
            Ok(())
        } else {
            Err(self.expected(kw.as_str()))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<(String, Origin), ParseError> {
        self.maybe_ident().ok_or_else(|| self.expected("identifier"))
    }

    /// An identifier, or a keyword read as a plain name. Member
    /// positions accept keyword spellings (`new`, notably).
    pub(crate) fn maybe_word(&mut self) -> Option<(String, Origin)> {
        let out = match self.current()? {
            Token { kind: TokenKind::Ident(name), origin } => (name.clone(), *origin),
            Token { kind: TokenKind::Kw(kw), origin } => (kw.as_str().to_owned(), *origin),
            _ => return None,
        };
        self.advance();
        Some(out)
    }

    pub(crate) fn expect_word(&mut self) -> Result<(String, Origin), ParseError> {
        self.maybe_word().ok_or_else(|| self.expected("member name"))
    }

    /// Build an `Expected <wanted>, got <current>` error at the current
    /// position.
    pub(crate) fn expected(&self, wanted: impl Into<String>) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Expected {
                wanted: wanted.into(),
                got: self.describe(),
            },
            origin: self.origin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cursor(src: &str) -> Cursor {
        let tokens = crema_lexer::tokenize(src).expect("tokenize");
        let eof = crema_diagnostic::LineIndex::new(src).origin(src.len() as u32);
        Cursor::new(tokens, eof)
    }

    #[test]
    fn maybe_consumes_only_on_match() {
        let mut c = cursor("( )");
        assert!(!c.maybe_punct(")"));
        assert!(c.maybe_punct("("));
        assert!(c.maybe_punct(")"));
        assert!(c.current().is_none());
    }

    #[test]
    fn expected_at_eof_reports_eof() {
        let c = cursor("1");
        let mut c = c;
        c.advance();
        let err = c.expected(")");
        assert_eq!(err.to_string(), "Expected ), got EOF (1|1:1)");
    }

    #[test]
    fn expected_names_the_offending_token() {
        let c = cursor("if");
        let err = c.expected("identifier");
        assert_eq!(err.to_string(), "Expected identifier, got kw:if (1|0:0)");
    }
}
