//! The grammar: precedence climbing over the token cursor.
//!
//! One token of lookahead everywhere. Contextual forms (object literal
//! vs. block, relaxed identifiers after access operators, keyword
//! operators) are decided positionally, never by backtracking.

mod decls;
mod flow;
mod literals;
mod strings;

use tracing::trace;

use crema_ir::{
    Ast, BranchKind, ExprId, ExprKind, HoistedDecl, Literal, OpKind, Origin, Program,
};
use crema_lexer::{Kw, Token, TokenKind};

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrorKind};
use crate::precedence::{
    binary_prec, is_right_assoc, unary_prec, ACCESS_PREC, ASSIGN_PREC, POSTFIX_PREC, TUPLE_PREC,
    WORD_CMP_PREC,
};

pub(crate) struct Parser {
    cursor: Cursor,
    ast: Ast,
    /// One frame of hoisted declarations per open block.
    scopes: Vec<Vec<HoistedDecl>>,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>, eof: Origin) -> Self {
        Parser {
            cursor: Cursor::new(tokens, eof),
            ast: Ast::new(),
            scopes: Vec::new(),
        }
    }

    pub(crate) fn parse_program(mut self) -> Result<Program, ParseError> {
        self.scopes.push(Vec::new());
        let stmts = self.semichain()?;
        let hoisted = self.scopes.pop().unwrap_or_default();
        if self.cursor.current().is_some() {
            return Err(self.cursor.expected("end of input"));
        }
        let root = self.ast.alloc(ExprKind::Block { stmts, hoisted }, None);
        Ok(Program { ast: self.ast, root })
    }

    fn alloc(&mut self, kind: ExprKind, origin: Origin) -> ExprId {
        self.ast.alloc(kind, Some(origin))
    }

    fn hoist(&mut self, name: &str, mutable: bool) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.push(HoistedDecl { name: name.to_owned(), mutable });
        }
    }

    /// Statements separated by (optional, repeatable) semicolons, up to
    /// a closer the expression grammar refuses to consume.
    fn semichain(&mut self) -> Result<Vec<ExprId>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            let origin = self.cursor.origin();
            if self.cursor.maybe_kw(Kw::Var) {
                stmts.extend(self.decl_group(true, origin)?);
            } else if self.cursor.maybe_kw(Kw::Const) {
                stmts.extend(self.decl_group(false, origin)?);
            } else {
                match self.expr(0)? {
                    Some(x) => stmts.push(x),
                    None => break,
                }
            }
            while self.cursor.maybe_punct(";") {}
        }
        Ok(stmts)
    }

    /// Collapse a statement chain: none for an empty chain, the lone
    /// statement when nothing was hoisted, a block otherwise.
    fn seq_expr(&mut self, stmts: Vec<ExprId>, hoisted: Vec<HoistedDecl>, origin: Origin) -> ExprId {
        if hoisted.is_empty() {
            match stmts.len() {
                0 => return self.alloc(ExprKind::Literal(Literal::None), origin),
                1 => return stmts[0],
                _ => {}
            }
        }
        self.alloc(ExprKind::Block { stmts, hoisted }, origin)
    }

    /// A block position: `{ … }` opens a statement block (never an
    /// object literal here) and a new hoisting frame; anything else is
    /// a single expression with an optional trailing semicolon.
    fn block(&mut self) -> Result<ExprId, ParseError> {
        let origin = self.cursor.origin();
        if self.cursor.maybe_punct("{") {
            self.scopes.push(Vec::new());
            let stmts = self.semichain()?;
            let hoisted = self.scopes.pop().unwrap_or_default();
            self.cursor.expect_punct("}")?;
            Ok(self.seq_expr(stmts, hoisted, origin))
        } else {
            let x = self.require_expr(0)?;
            self.cursor.maybe_punct(";");
            Ok(x)
        }
    }

    fn then_else(&mut self) -> Result<(Option<ExprId>, Option<ExprId>), ParseError> {
        let then_branch = if self.cursor.maybe_kw(Kw::Then) {
            Some(self.block()?)
        } else {
            None
        };
        let else_branch = if self.cursor.maybe_kw(Kw::Else) {
            Some(self.block()?)
        } else {
            None
        };
        Ok((then_branch, else_branch))
    }

    fn require_expr(&mut self, min_prec: u8) -> Result<ExprId, ParseError> {
        self.expr(min_prec)?
            .ok_or_else(|| self.cursor.expected("expression"))
    }

    /// An l-value position: a single atom whose node is l-value
    /// capable.
    fn lvalue(&mut self) -> Result<ExprId, ParseError> {
        let fallback = self.cursor.origin();
        let x = self
            .atom()?
            .ok_or_else(|| self.cursor.expected("expression"))?;
        self.check_lvalue(x, fallback)?;
        Ok(x)
    }

    fn opt_lvalue(&mut self) -> Result<Option<ExprId>, ParseError> {
        let fallback = self.cursor.origin();
        match self.atom()? {
            Some(x) => {
                self.check_lvalue(x, fallback)?;
                Ok(Some(x))
            }
            None => Ok(None),
        }
    }

    fn check_lvalue(&self, x: ExprId, fallback: Origin) -> Result<(), ParseError> {
        if self.ast.caps(x).lvalue {
            Ok(())
        } else {
            Err(ParseError {
                kind: ParseErrorKind::NotAnLvalue,
                origin: self.ast.origin(x).unwrap_or(fallback),
            })
        }
    }

    /// A member-name position: identifier-, keyword-, operator-, or
    /// string-shaped tokens all read as names.
    fn relaxid(&mut self) -> Result<Option<ExprId>, ParseError> {
        let Some(tok) = self.cursor.current() else {
            return Ok(None);
        };
        let origin = tok.origin;
        let name = tok.relaxed_name();
        let is_str = matches!(tok.kind, TokenKind::Str { .. });

        if is_str {
            if let Some(Token { kind: TokenKind::Str { text, raw }, .. }) = self.cursor.bump() {
                return self.process_string(&text, raw, origin).map(Some);
            }
        }
        match name {
            Some(name) => {
                self.cursor.advance();
                Ok(Some(self.alloc(ExprKind::Literal(Literal::Str(name)), origin)))
            }
            None => Ok(None),
        }
    }

    /// Items separated by a structural punctuation token; stops at the
    /// first position where `item` declines.
    fn listing(
        &mut self,
        sep: &'static str,
        mut item: impl FnMut(&mut Self) -> Result<Option<ExprId>, ParseError>,
    ) -> Result<Vec<ExprId>, ParseError> {
        let mut out = Vec::new();
        while let Some(x) = item(self)? {
            out.push(x);
            if !self.cursor.maybe_punct(sep) {
                break;
            }
        }
        Ok(out)
    }

    fn assign(
        &mut self,
        target: ExprId,
        value: ExprId,
        op: Option<OpKind>,
        origin: Origin,
    ) -> Result<ExprId, ParseError> {
        self.check_lvalue(target, origin)?;
        Ok(self.alloc(ExprKind::Assign { target, value, op }, origin))
    }

    /// Precedence climbing. Returns `None` without consuming anything
    /// when the current token cannot start an expression.
    fn expr(&mut self, min_prec: u8) -> Result<Option<ExprId>, ParseError> {
        let Some(mut lhs) = self.atom()? else {
            return Ok(None);
        };

        loop {
            let Some(tok) = self.cursor.current() else { break };
            let origin = tok.origin;
            let kind = tok.kind.clone();

            match kind {
                // Call and subscript bind at the tightest precedence.
                TokenKind::Punct("(") => {
                    self.cursor.advance();
                    let args = self.listing(",", |p| p.expr(TUPLE_PREC + 1))?;
                    self.cursor.expect_punct(")")?;
                    lhs = self.alloc(ExprKind::Call { callee: lhs, args }, origin);
                }
                TokenKind::Punct("[") => {
                    self.cursor.advance();
                    let subscripts = self.listing(":", |p| p.expr(0))?;
                    self.cursor.expect_punct("]")?;
                    lhs = self.alloc(ExprKind::Index { object: lhs, subscripts }, origin);
                }
                TokenKind::Op("." | "->" | "::") => {
                    if ACCESS_PREC < min_prec {
                        break;
                    }
                    lhs = self.access_chain(lhs, ACCESS_PREC)?;
                }
                TokenKind::Op(op @ ("++" | "--")) => {
                    if POSTFIX_PREC < min_prec {
                        break;
                    }
                    // `if c {} ++x` is a new statement, not a postfix
                    // update of the conditional.
                    if matches!(
                        self.ast.kind(lhs),
                        ExprKind::If { .. } | ExprKind::Loop { .. } | ExprKind::ForLoop { .. }
                    ) {
                        break;
                    }
                    self.cursor.advance();
                    let one = self.alloc(ExprKind::Literal(Literal::Int(1)), origin);
                    let delta = if op == "++" { OpKind::Add } else { OpKind::Sub };
                    let update = self.assign(lhs, one, Some(delta), origin)?;
                    lhs = self.alloc(ExprKind::After { value: lhs, update }, origin);
                }
                TokenKind::Punct(",") => {
                    if TUPLE_PREC < min_prec {
                        break;
                    }
                    self.cursor.advance();
                    let mut elems = vec![lhs];
                    loop {
                        match self.expr(TUPLE_PREC + 1)? {
                            Some(e) => elems.push(e),
                            None => break,
                        }
                        if !self.cursor.maybe_punct(",") {
                            break;
                        }
                    }
                    lhs = self.alloc(ExprKind::Tuple(elems), origin);
                }
                TokenKind::Assign(op) => {
                    if ASSIGN_PREC < min_prec {
                        break;
                    }
                    self.cursor.advance();
                    let op = match op {
                        Some(s) => Some(
                            OpKind::from_str(s)
                                .ok_or_else(|| self.cursor.expected("assignable operator"))?,
                        ),
                        None => None,
                    };
                    // Right associative: `a = b = c` assigns `b` first.
                    let rhs = self.require_expr(ASSIGN_PREC)?;
                    lhs = self.assign(lhs, rhs, op, origin)?;
                }
                TokenKind::Op(op) | TokenKind::Cmp(op) => {
                    let (Some(prec), Some(op_kind)) = (binary_prec(op), OpKind::from_str(op))
                    else {
                        break;
                    };
                    if prec < min_prec {
                        break;
                    }
                    self.cursor.advance();
                    let next_min = if is_right_assoc(op) { prec } else { prec + 1 };
                    let rhs = self.require_expr(next_min)?;
                    lhs = self.alloc(ExprKind::Op { op: op_kind, operands: vec![lhs, rhs] }, origin);
                }
                TokenKind::Kw(kw @ (Kw::In | Kw::Is | Kw::Has)) => {
                    if WORD_CMP_PREC < min_prec {
                        break;
                    }
                    self.cursor.advance();
                    let rhs = self.require_expr(WORD_CMP_PREC + 1)?;
                    let op = match kw {
                        Kw::In => OpKind::In,
                        Kw::Is => OpKind::Is,
                        _ => OpKind::Has,
                    };
                    lhs = self.alloc(ExprKind::Op { op, operands: vec![lhs, rhs] }, origin);
                }
                _ => break,
            }
        }

        Ok(Some(lhs))
    }

    /// A run of `.`/`->`/`::` accesses with relaxed identifiers on the
    /// right.
    fn access_chain(&mut self, mut lhs: ExprId, min_prec: u8) -> Result<ExprId, ParseError> {
        loop {
            let Some(tok) = self.cursor.current() else { break };
            let origin = tok.origin;
            let TokenKind::Op(op @ ("." | "->" | "::")) = tok.kind else {
                break;
            };
            if ACCESS_PREC < min_prec {
                break;
            }
            self.cursor.advance();
            let member = self
                .relaxid()?
                .ok_or_else(|| self.cursor.expected("relaxed identifier"))?;
            let member = self.access_chain(member, ACCESS_PREC + 1)?;
            lhs = match op {
                "." => self.alloc(ExprKind::Index { object: lhs, subscripts: vec![member] }, origin),
                "->" => self.alloc(ExprKind::Bind { object: lhs, member }, origin),
                _ => self.alloc(ExprKind::Descope { object: lhs, member }, origin),
            };
        }
        Ok(lhs)
    }

    /// One atom. Returns `None` without consuming for tokens that close
    /// an enclosing construct.
    fn atom(&mut self) -> Result<Option<ExprId>, ParseError> {
        let Some(tok) = self.cursor.current() else {
            return Ok(None);
        };
        let origin = tok.origin;
        let kind = tok.kind.clone();

        match &kind {
            TokenKind::Punct(")" | "]" | "}" | ";") => return Ok(None),
            TokenKind::Kw(Kw::Case | Kw::Else) => return Ok(None),
            _ => {}
        }
        trace!(token = %self.cursor.describe(), "atom");
        self.cursor.advance();

        let expr = match kind {
            TokenKind::Int(n) => self.alloc(ExprKind::Literal(Literal::Int(n)), origin),
            TokenKind::Float(x) => self.alloc(ExprKind::Literal(Literal::Float(x)), origin),
            TokenKind::Str { text, raw } => self.process_string(&text, raw, origin)?,
            TokenKind::Ident(name) => {
                let ident = self.alloc(ExprKind::Ident { name, mutable: true }, origin);
                // `f"text"`: an identifier directly followed by a
                // string literal calls it with that one argument.
                if matches!(self.cursor.current(), Some(t) if matches!(t.kind, TokenKind::Str { .. }))
                {
                    if let Some(Token { kind: TokenKind::Str { text, raw }, origin: s_origin }) =
                        self.cursor.bump()
                    {
                        let arg = self.process_string(&text, raw, s_origin)?;
                        return Ok(Some(self.alloc(
                            ExprKind::Call { callee: ident, args: vec![arg] },
                            s_origin,
                        )));
                    }
                }
                ident
            }
            TokenKind::Punct("(") => self.paren_group(origin)?,
            TokenKind::Punct("{") => self.object_literal(origin)?,
            TokenKind::Punct("[") => self.list_literal(origin)?,
            TokenKind::Op(op) => self.prefix(op, origin)?,
            TokenKind::Kw(kw) => self.keyword_atom(kw, origin)?,
            TokenKind::Punct(p) => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken(format!("punc:{p}")),
                    origin,
                })
            }
            TokenKind::Cmp(op) => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken(format!("cmp:{op}")),
                    origin,
                })
            }
            TokenKind::Assign(_) => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken("assign:=".to_owned()),
                    origin,
                })
            }
        };
        Ok(Some(expr))
    }

    /// `( … )`: the unit tuple, or a parenthesized statement chain.
    /// Declarations inside parentheses hoist to the enclosing block.
    fn paren_group(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        if self.cursor.maybe_punct(")") {
            return Ok(self.alloc(ExprKind::Tuple(Vec::new()), origin));
        }
        let stmts = self.semichain()?;
        self.cursor.expect_punct(")")?;
        Ok(self.seq_expr(stmts, Vec::new(), origin))
    }

    fn prefix(&mut self, op: &'static str, origin: Origin) -> Result<ExprId, ParseError> {
        let Some(prec) = unary_prec(op) else {
            return Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken(format!("op:{op}")),
                origin,
            });
        };
        match op {
            "..." => {
                let inner = self.require_expr(prec)?;
                Ok(self.alloc(ExprKind::Spread(inner), origin))
            }
            // Prefix update: `++x` is `x += 1` and yields the new value.
            "++" | "--" => {
                let target = self.require_expr(prec)?;
                let one = self.alloc(ExprKind::Literal(Literal::Int(1)), origin);
                let delta = if op == "++" { OpKind::Add } else { OpKind::Sub };
                self.assign(target, one, Some(delta), origin)
            }
            _ => {
                let rhs = self.require_expr(prec)?;
                let op_kind = OpKind::from_str(op).ok_or(ParseError {
                    kind: ParseErrorKind::UnexpectedToken(format!("op:{op}")),
                    origin,
                })?;
                Ok(self.alloc(ExprKind::Op { op: op_kind, operands: vec![rhs] }, origin))
            }
        }
    }

    fn keyword_atom(&mut self, kw: Kw, origin: Origin) -> Result<ExprId, ParseError> {
        match kw {
            Kw::If => self.parse_if(origin),
            Kw::Loop => self.parse_loop(origin),
            Kw::While => self.parse_while(origin),
            Kw::For => self.parse_for(origin),
            Kw::Switch => self.parse_switch(origin),
            Kw::Try => self.parse_try(origin),
            Kw::Proto => self.parse_proto(origin),
            Kw::Function => self.parse_function(origin),
            Kw::Import => {
                let inner = self.require_expr(0)?;
                Ok(self.alloc(ExprKind::Import(inner), origin))
            }
            Kw::Return => {
                let value = self.opt_value(origin)?;
                Ok(self.alloc(ExprKind::Return(value), origin))
            }
            Kw::Fail => {
                let value = self.opt_value(origin)?;
                Ok(self.alloc(ExprKind::Fail(value), origin))
            }
            Kw::Break => self.parse_branch(BranchKind::Break, origin),
            Kw::Continue => self.parse_branch(BranchKind::Continue, origin),
            Kw::Redo => self.parse_branch(BranchKind::Redo, origin),
            Kw::Var => {
                let group = self.decl_group(true, origin)?;
                Ok(self.seq_expr(group, Vec::new(), origin))
            }
            Kw::Const => {
                let group = self.decl_group(false, origin)?;
                Ok(self.seq_expr(group, Vec::new(), origin))
            }
            _ => Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken(format!("kw:{}", kw.as_str())),
                origin,
            }),
        }
    }

    /// An optional operand (for `return`/`fail`); missing means none.
    fn opt_value(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        match self.expr(0)? {
            Some(x) => Ok(x),
            None => Ok(self.alloc(ExprKind::Literal(Literal::None), origin)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::testutil::sexp;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn precedence_orders_arithmetic() {
        assert_eq!(
            sexp("1 + 2 * 3"),
            json!(["block", [["+", ["const", 1], ["*", ["const", 2], ["const", 3]]]], []])
        );
    }

    #[test]
    fn exponentiation_groups_rightward() {
        assert_eq!(
            sexp("2 ** 3 ** 2"),
            json!(["block", [["**", ["const", 2], ["**", ["const", 3], ["const", 2]]]], []])
        );
    }

    #[test]
    fn unary_minus_is_a_one_operand_node() {
        assert_eq!(sexp("-x"), json!(["block", [["-", ["id", "x", true]]], []]));
    }

    #[test]
    fn comma_builds_tuples_below_assignment() {
        assert_eq!(
            sexp("a, b = c"),
            json!(["block", [[
                "=", null,
                ["tuple", ["id", "a", true], ["id", "b", true]],
                ["id", "c", true]
            ]], []])
        );
    }

    #[test]
    fn compound_assignment_carries_its_operator() {
        assert_eq!(
            sexp("x += 1"),
            json!(["block", [["=", "+", ["id", "x", true], ["const", 1]]], []])
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(
            sexp("a = b = c"),
            json!(["block", [[
                "=", null, ["id", "a", true],
                ["=", null, ["id", "b", true], ["id", "c", true]]
            ]], []])
        );
    }

    #[test]
    fn calls_and_subscripts_are_postfix() {
        assert_eq!(
            sexp("f(1, 2)[0]"),
            json!(["block", [[
                ".",
                ["call", ["id", "f", true], [["const", 1], ["const", 2]]],
                [["const", 0]]
            ]], []])
        );
    }

    #[test]
    fn member_access_accepts_keywords_and_operators() {
        assert_eq!(
            sexp("obj.if"),
            json!(["block", [[".", ["id", "obj", true], [["const", "if"]]]], []])
        );
        assert_eq!(
            sexp("obj.+"),
            json!(["block", [[".", ["id", "obj", true], [["const", "+"]]]], []])
        );
    }

    #[test]
    fn bind_and_descope_chain_leftward() {
        assert_eq!(
            sexp("a->b::c"),
            json!(["block", [[
                "::",
                ["->", ["id", "a", true], ["const", "b"]],
                ["const", "c"]
            ]], []])
        );
    }

    #[test]
    fn string_call_sugar() {
        assert_eq!(
            sexp("print'hi'"),
            json!(["block", [["call", ["id", "print", true], [["const", "hi"]]]], []])
        );
    }

    #[test]
    fn postfix_update_yields_pre_value() {
        assert_eq!(
            sexp("i++"),
            json!(["block", [[
                "after",
                ["id", "i", true],
                ["=", "+", ["id", "i", true], ["const", 1]]
            ]], []])
        );
    }

    #[test]
    fn prefix_update_is_a_compound_assignment() {
        assert_eq!(
            sexp("--i"),
            json!(["block", [["=", "-", ["id", "i", true], ["const", 1]]], []])
        );
    }

    #[test]
    fn range_and_membership_operators() {
        assert_eq!(
            sexp("1..5"),
            json!(["block", [["..", ["const", 1], ["const", 5]]], []])
        );
        assert_eq!(
            sexp("x in xs"),
            json!(["block", [["in", ["id", "x", true], ["id", "xs", true]]], []])
        );
    }

    #[test]
    fn spread_in_call_arguments() {
        assert_eq!(
            sexp("f(...xs)"),
            json!(["block", [["call", ["id", "f", true], [["...", ["id", "xs", true]]]]], []])
        );
    }

    #[test]
    fn empty_parens_are_the_unit_tuple() {
        assert_eq!(sexp("()"), json!(["block", [["tuple"]], []]));
    }

    #[test]
    fn word_operator_aliases() {
        assert_eq!(
            sexp("a and b or not c"),
            json!(["block", [[
                "||",
                ["&&", ["id", "a", true], ["id", "b", true]],
                ["!", ["id", "c", true]]
            ]], []])
        );
    }

    #[test]
    fn dangling_operator_reports_eof() {
        let err = parse("1 +").unwrap_err();
        assert_eq!(err.to_string(), "Expected expression, got EOF (1|3:3)");
    }

    #[test]
    fn assigning_to_a_literal_is_rejected() {
        let err = parse("5 = 1").unwrap_err();
        assert_eq!(err.to_string(), "Not an l-value (1|0:0)");
    }

    #[test]
    fn unbalanced_paren_names_the_offender() {
        let err = parse("(1").unwrap_err();
        assert_eq!(err.to_string(), "Expected ), got EOF (1|2:2)");
    }
}
