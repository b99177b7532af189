//! Parser: token stream to annotated arena AST.
//!
//! A precedence-climbing expression grammar where every construct is an
//! expression, including declarations and control flow. The parser
//! performs declaration hoisting (names surface on their enclosing
//! block node) and computes l-value/r-value capability flags at node
//! construction, so the evaluator never re-derives either.

mod cursor;
mod error;
mod grammar;
mod precedence;

pub use error::{ParseError, ParseErrorKind};

use crema_diagnostic::LineIndex;
use crema_ir::Program;

/// Parse a source unit into a program.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = crema_lexer::tokenize(source).map_err(ParseError::from_lex)?;
    tracing::debug!(tokens = tokens.len(), "parsing source unit");

    let eof = LineIndex::new(source).origin(source.len() as u32);
    grammar::Parser::new(tokens, eof).parse_program()
}

#[cfg(test)]
pub(crate) mod testutil {
    use serde_json::Value as Json;

    /// Parse and serialize, with `["line", n, node]` wrappers stripped
    /// so assertions read as plain s-expressions.
    pub(crate) fn sexp(src: &str) -> Json {
        let program = crate::parse(src).expect("parse");
        strip(crema_ir::sexp::to_json(&program))
    }

    fn strip(v: Json) -> Json {
        match v {
            Json::Array(mut items) => {
                if items.len() == 3 && items[0].as_str() == Some("line") {
                    return strip(items.remove(2));
                }
                Json::Array(items.into_iter().map(strip).collect())
            }
            other => other,
        }
    }
}
