//! Object and list literals.

use crema_ir::{ExprId, ExprKind, Literal, Origin};
use crema_lexer::TokenKind;

use crate::error::{ParseError, ParseErrorKind};
use crate::precedence::TUPLE_PREC;

use super::Parser;

impl Parser {
    /// `{ … }` in expression position, the `{` already consumed.
    ///
    /// Entries are `key: value` pairs, `name(params) block` method
    /// sugar, or a bare name as shorthand for `name: name`. Commas
    /// between entries are optional.
    pub(super) fn object_literal(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let mut entries = Vec::new();
        while !self.cursor.maybe_punct("}") {
            if self.cursor.current().is_none() {
                return Err(self.cursor.expected("}"));
            }
            let (key, name) = self.object_key()?;

            let value = if self.cursor.maybe_punct("(") {
                let params = self.listing(",", Parser::opt_lvalue)?;
                self.cursor.expect_punct(")")?;
                let body = self.block()?;
                let fn_name = name.as_ref().map(|(n, _)| n.clone());
                self.alloc(ExprKind::Function { name: fn_name, params, body }, origin)
            } else if self.cursor.maybe_punct(":") {
                self.require_expr(TUPLE_PREC + 1)?
            } else {
                let Some((name, name_origin)) = name else {
                    return Err(self.cursor.expected(":"));
                };
                self.alloc(ExprKind::Ident { name, mutable: true }, name_origin)
            };

            entries.push((key, value));
            self.cursor.maybe_punct(",");
        }
        Ok(self.alloc(ExprKind::Object(entries), origin))
    }

    /// An object key: number, string, or any name-shaped token. The
    /// name is returned alongside for shorthand and method sugar.
    fn object_key(&mut self) -> Result<(ExprId, Option<(String, Origin)>), ParseError> {
        let Some(tok) = self.cursor.current() else {
            return Err(self.cursor.expected("member key"));
        };
        let origin = tok.origin;
        let relaxed = tok.relaxed_name();
        let kind = tok.kind.clone();

        match kind {
            TokenKind::Int(n) => {
                self.cursor.advance();
                Ok((self.alloc(ExprKind::Literal(Literal::Int(n)), origin), None))
            }
            TokenKind::Float(x) => {
                self.cursor.advance();
                Ok((self.alloc(ExprKind::Literal(Literal::Float(x)), origin), None))
            }
            TokenKind::Str { text, raw } => {
                self.cursor.advance();
                Ok((self.process_string(&text, raw, origin)?, None))
            }
            other => {
                let name = relaxed.ok_or(ParseError {
                    kind: ParseErrorKind::UnexpectedToken(other.to_string()),
                    origin,
                })?;
                self.cursor.advance();
                let key = self.alloc(ExprKind::Literal(Literal::Str(name.clone())), origin);
                Ok((key, Some((name, origin))))
            }
        }
    }

    /// `[ … ]`, the `[` already consumed. Elements parse above the
    /// tuple comma; a trailing comma is allowed.
    pub(super) fn list_literal(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        if self.cursor.maybe_punct("]") {
            return Ok(self.alloc(ExprKind::List(Vec::new()), origin));
        }
        let mut elems = Vec::new();
        loop {
            elems.push(self.require_expr(TUPLE_PREC + 1)?);
            if !self.cursor.maybe_punct(",") {
                break;
            }
            if self.cursor.at_punct("]") {
                break;
            }
        }
        self.cursor.expect_punct("]")?;
        Ok(self.alloc(ExprKind::List(elems), origin))
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::testutil::sexp;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_object_and_list() {
        assert_eq!(sexp("{}"), json!(["block", [["object"]], []]));
        assert_eq!(sexp("[]"), json!(["block", [["list"]], []]));
    }

    #[test]
    fn object_entries_and_shorthand() {
        assert_eq!(
            sexp("{a: 1, b}"),
            json!(["block", [[
                "object",
                [["const", "a"], ["const", 1]],
                [["const", "b"], ["id", "b", true]]
            ]], []])
        );
    }

    #[test]
    fn object_method_sugar() {
        assert_eq!(
            sexp("{f() { 1 }}"),
            json!(["block", [[
                "object",
                [["const", "f"], ["fn", "f", [], ["const", 1]]]
            ]], []])
        );
    }

    #[test]
    fn keyword_and_string_keys() {
        assert_eq!(
            sexp("{if: 1, 'a b': 2}"),
            json!(["block", [[
                "object",
                [["const", "if"], ["const", 1]],
                [["const", "a b"], ["const", 2]]
            ]], []])
        );
    }

    #[test]
    fn numeric_keys_stay_numeric() {
        assert_eq!(
            sexp("{1: 'a'}"),
            json!(["block", [["object", [["const", 1], ["const", "a"]]]], []])
        );
    }

    #[test]
    fn commas_between_entries_are_optional() {
        assert_eq!(
            sexp("{a: 1 b: 2}"),
            json!(["block", [[
                "object",
                [["const", "a"], ["const", 1]],
                [["const", "b"], ["const", 2]]
            ]], []])
        );
    }

    #[test]
    fn list_elements_split_at_commas() {
        assert_eq!(
            sexp("[1, 2, 3,]"),
            json!(["block", [["list", ["const", 1], ["const", 2], ["const", 3]]], []])
        );
    }

    #[test]
    fn spread_inside_a_list() {
        assert_eq!(
            sexp("[...xs]"),
            json!(["block", [["list", ["...", ["id", "xs", true]]]], []])
        );
    }

    #[test]
    fn punctuation_cannot_key_an_object() {
        let err = parse("{:}").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token punc:: (1|1:1)");
    }
}
