//! String literal processing: escape decoding and interpolation.
//!
//! Interpolation regions are re-lexed and parsed with the same parser,
//! swapping the cursor out and back so the region's nodes land in the
//! same arena as the enclosing program.

use crema_ir::{ExprId, ExprKind, FormatPart, Literal, Origin};
use crema_lexer::{decode_escapes, split_format, StrPart};

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrorKind};

use super::Parser;

impl Parser {
    /// Build the node for a string literal. Raw strings and strings
    /// with no interpolation become plain literals, a string that is a
    /// single region collapses to that region's expression, and mixed
    /// content becomes a format node.
    pub(super) fn process_string(
        &mut self,
        text: &str,
        raw: bool,
        origin: Origin,
    ) -> Result<ExprId, ParseError> {
        if raw {
            return Ok(self.alloc(ExprKind::Literal(Literal::Str(text.to_owned())), origin));
        }
        let parts = split_format(text);
        match parts.as_slice() {
            [] => Ok(self.alloc(ExprKind::Literal(Literal::Str(String::new())), origin)),
            [StrPart::Text(t)] => {
                Ok(self.alloc(ExprKind::Literal(Literal::Str(decode_escapes(t))), origin))
            }
            [StrPart::Interp(region)] => self.parse_region(region, origin),
            _ => {
                let mut out = Vec::with_capacity(parts.len());
                for part in &parts {
                    match part {
                        StrPart::Text(t) => out.push(FormatPart::Text(decode_escapes(t))),
                        StrPart::Interp(region) => {
                            out.push(FormatPart::Expr(self.parse_region(region, origin)?));
                        }
                    }
                }
                Ok(self.alloc(ExprKind::Format(out), origin))
            }
        }
    }

    /// Parse one interpolation region as a statement chain. Errors
    /// inside the region report at the enclosing string literal.
    fn parse_region(&mut self, src: &str, origin: Origin) -> Result<ExprId, ParseError> {
        let tokens = crema_lexer::tokenize(src).map_err(|e| ParseError {
            kind: ParseErrorKind::Lex(e.kind),
            origin,
        })?;

        let saved = std::mem::replace(&mut self.cursor, Cursor::new(tokens, origin));
        self.scopes.push(Vec::new());

        let stmts = self.semichain().and_then(|stmts| {
            if self.cursor.current().is_some() {
                Err(self.cursor.expected("end of interpolation"))
            } else {
                Ok(stmts)
            }
        });

        let hoisted = self.scopes.pop().unwrap_or_default();
        self.cursor = saved;
        Ok(self.seq_expr(stmts?, hoisted, origin))
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::testutil::sexp;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn escapes_decode_in_plain_strings() {
        assert_eq!(sexp("'a\\tb'"), json!(["block", [["const", "a\tb"]], []]));
    }

    #[test]
    fn raw_strings_keep_escapes_intact() {
        assert_eq!(sexp("`a\\tb`"), json!(["block", [["const", "a\\tb"]], []]));
    }

    #[test]
    fn whole_string_region_collapses_to_its_expression() {
        assert_eq!(sexp("\"\\{x}\""), json!(["block", [["id", "x", true]], []]));
    }

    #[test]
    fn mixed_content_builds_a_format_node() {
        assert_eq!(
            sexp("\"a\\{x}b\""),
            json!(["block", [["format", "a", ["id", "x", true], "b"]], []])
        );
    }

    #[test]
    fn region_may_hold_a_statement_chain() {
        assert_eq!(
            sexp("\"\\{1; 2}\""),
            json!(["block", [["block", [["const", 1], ["const", 2]], []]], []])
        );
    }

    #[test]
    fn region_expressions_parse_with_full_precedence() {
        assert_eq!(
            sexp("\"n=\\{x + 1}\""),
            json!(["block", [["format", "n=", ["+", ["id", "x", true], ["const", 1]]]], []])
        );
    }

    #[test]
    fn region_errors_report_at_the_string() {
        let err = parse("\"\\{+}\"").unwrap_err();
        assert_eq!(err.to_string(), "Expected expression, got EOF (1|0:0)");
    }
}
