//! Control flow: conditionals, loops, switch, try, branch statements.

use crema_ir::{BranchKind, Case, CaseOp, ExprId, ExprKind, Origin};
use crema_lexer::{Kw, Token, TokenKind};

use crate::error::{ParseError, ParseErrorKind};

use super::Parser;

impl Parser {
    /// `if cond [then] block [else block]`. The `then` keyword is
    /// optional noise before the consequent.
    pub(super) fn parse_if(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let cond = self.require_expr(0)?;
        self.cursor.maybe_kw(Kw::Then);
        let then_branch = self.block()?;
        let else_branch = if self.cursor.maybe_kw(Kw::Else) {
            Some(self.block()?)
        } else {
            None
        };
        Ok(self.alloc(ExprKind::If { cond, then_branch, else_branch }, origin))
    }

    /// `loop A [while c B [then T] [else E]]`. The `always` part runs
    /// before the condition on every iteration, so the bare form is an
    /// infinite loop.
    pub(super) fn parse_loop(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let always = self.block()?;
        if self.cursor.maybe_kw(Kw::While) {
            let cond = self.require_expr(0)?;
            let body = self.block()?;
            let (then_branch, else_branch) = self.then_else()?;
            Ok(self.alloc(
                ExprKind::Loop {
                    always: Some(always),
                    cond: Some(cond),
                    body: Some(body),
                    then_branch,
                    else_branch,
                },
                origin,
            ))
        } else {
            Ok(self.alloc(
                ExprKind::Loop {
                    always: Some(always),
                    cond: None,
                    body: None,
                    then_branch: None,
                    else_branch: None,
                },
                origin,
            ))
        }
    }

    /// `while c B [then T] [else E]`: a loop with no `always` part.
    pub(super) fn parse_while(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let cond = self.require_expr(0)?;
        let body = self.block()?;
        let (then_branch, else_branch) = self.then_else()?;
        Ok(self.alloc(
            ExprKind::Loop {
                always: None,
                cond: Some(cond),
                body: Some(body),
                then_branch,
                else_branch,
            },
            origin,
        ))
    }

    /// `for ([var|const] x in it) B [then T] [else E]`. The qualifier
    /// is accepted and ignored; the binding is always loop-local.
    pub(super) fn parse_for(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        self.cursor.expect_punct("(")?;
        let _ = self.cursor.maybe_kw(Kw::Var) || self.cursor.maybe_kw(Kw::Const);
        let binding = self.lvalue()?;
        self.cursor.expect_kw(Kw::In)?;
        let iterable = self.require_expr(0)?;
        self.cursor.expect_punct(")")?;
        let body = self.block()?;
        let (then_branch, else_branch) = self.then_else()?;
        Ok(self.alloc(
            ExprKind::ForLoop { binding, iterable, body, then_branch, else_branch },
            origin,
        ))
    }

    /// `switch x { case … } [then T] [else E]`.
    ///
    /// Cases are collected in source order, then `:` cases are linked to
    /// their immediate successor in one pass over the list.
    pub(super) fn parse_switch(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let scrutinee = self.require_expr(0)?;
        self.cursor.expect_punct("{")?;

        let mut cases = Vec::new();
        let mut default = None;
        while !self.cursor.maybe_punct("}") {
            let case_origin = self.cursor.origin();

            let (op, value) = if self.cursor.maybe_kw(Kw::Case) {
                let op = if self.cursor.maybe_kw(Kw::In) {
                    CaseOp::In
                } else {
                    CaseOp::Eq
                };
                (op, Some(self.require_expr(0)?))
            } else if self.cursor.maybe_kw(Kw::Else) {
                (CaseOp::Else, None)
            } else {
                return Err(self.cursor.expected("case or else"));
            };

            let falls_through = if self.cursor.maybe_punct("=>") {
                false
            } else if self.cursor.maybe_punct(":") {
                true
            } else {
                return Err(self.cursor.expected(": or =>"));
            };

            let body = self.block()?;
            let id = self.ast.alloc_case(Case {
                op,
                value,
                body,
                falls_through,
                next: None,
                origin: Some(case_origin),
            });
            if op == CaseOp::Else {
                if default.is_some() {
                    return Err(ParseError {
                        kind: ParseErrorKind::DuplicateElseCase,
                        origin: case_origin,
                    });
                }
                default = Some(id);
            }
            cases.push(id);
        }

        let (then_branch, else_branch) = self.then_else()?;

        for i in 0..cases.len() {
            if self.ast.case(cases[i]).falls_through {
                self.ast.set_case_next(cases[i], cases.get(i + 1).copied());
            }
        }

        Ok(self.alloc(
            ExprKind::Switch { scrutinee, cases, default, then_branch, else_branch },
            origin,
        ))
    }

    /// `try B fail x H [then T] [else E]`.
    pub(super) fn parse_try(&mut self, origin: Origin) -> Result<ExprId, ParseError> {
        let body = self.block()?;
        self.cursor.expect_kw(Kw::Fail)?;
        let binding = self.lvalue()?;
        let handler = self.block()?;
        let (then_branch, else_branch) = self.then_else()?;
        Ok(self.alloc(
            ExprKind::Try { body, binding, handler, then_branch, else_branch },
            origin,
        ))
    }

    /// `break`/`continue`/`redo`, optionally targeting an enclosing
    /// loop by integer level. Level 0 is the innermost loop.
    pub(super) fn parse_branch(
        &mut self,
        kind: BranchKind,
        origin: Origin,
    ) -> Result<ExprId, ParseError> {
        let mut level = 0;
        if let Some(Token { kind: TokenKind::Int(n), .. }) = self.cursor.current() {
            level = u32::try_from(*n).map_err(|_| self.cursor.expected("loop level"))?;
            self.cursor.advance();
        }
        Ok(self.alloc(ExprKind::Branch { kind, level }, origin))
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::testutil::sexp;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn if_then_else() {
        assert_eq!(
            sexp("if x then 1 else 2"),
            json!(["block", [["if", ["id", "x", true], ["const", 1], ["const", 2]]], []])
        );
    }

    #[test]
    fn if_without_then_keyword() {
        assert_eq!(
            sexp("if x { 1 }"),
            json!(["block", [["if", ["id", "x", true], ["const", 1], null]], []])
        );
    }

    #[test]
    fn while_is_a_condition_only_loop() {
        assert_eq!(
            sexp("while x { 1 }"),
            json!(["block", [["loop", null, ["id", "x", true], ["const", 1], null, null]], []])
        );
    }

    #[test]
    fn while_keeps_then_and_else_arms() {
        assert_eq!(
            sexp("while x { 1 } then 2 else 3"),
            json!(["block", [[
                "loop", null, ["id", "x", true], ["const", 1], ["const", 2], ["const", 3]
            ]], []])
        );
    }

    #[test]
    fn bare_loop_is_always_only() {
        assert_eq!(
            sexp("loop { 1 }"),
            json!(["block", [["loop", ["const", 1], null, null, null, null]], []])
        );
    }

    #[test]
    fn loop_while_populates_both_halves() {
        assert_eq!(
            sexp("loop { 1 } while x { 2 } else 3"),
            json!(["block", [[
                "loop", ["const", 1], ["id", "x", true], ["const", 2], null, ["const", 3]
            ]], []])
        );
    }

    #[test]
    fn for_loop_ignores_the_binding_qualifier() {
        assert_eq!(
            sexp("for (var x in xs) { x }"),
            json!(["block", [[
                "for", ["id", "x", true], ["id", "xs", true], ["id", "x", true], null, null
            ]], []])
        );
    }

    #[test]
    fn switch_collects_cases_in_source_order() {
        assert_eq!(
            sexp("switch x { case 1 => 10 else => 30 }"),
            json!(["block", [[
                "switch",
                ["id", "x", true],
                [
                    ["case", "=", ["const", 1], ["const", 10], false],
                    ["case", "else", null, ["const", 30], false]
                ],
                null,
                null
            ]], []])
        );
    }

    #[test]
    fn switch_case_in_matches_membership() {
        assert_eq!(
            sexp("switch x { case in xs => 1 }"),
            json!(["block", [[
                "switch",
                ["id", "x", true],
                [["case", "in", ["id", "xs", true], ["const", 1], false]],
                null,
                null
            ]], []])
        );
    }

    #[test]
    fn switch_colon_case_falls_through() {
        assert_eq!(
            sexp("switch x { case 1: 10 case 2 => 20 }"),
            json!(["block", [[
                "switch",
                ["id", "x", true],
                [
                    ["case", "=", ["const", 1], ["const", 10], true],
                    ["case", "=", ["const", 2], ["const", 20], false]
                ],
                null,
                null
            ]], []])
        );
    }

    #[test]
    fn duplicate_else_case_is_rejected() {
        let err = parse("switch x { else => 1 else => 2 }").unwrap_err();
        assert_eq!(err.to_string(), "Duplicate else case (1|21:21)");
    }

    #[test]
    fn switch_requires_a_case_separator() {
        let err = parse("switch x { case 1 10 }").unwrap_err();
        assert_eq!(err.to_string(), "Expected : or =>, got num:10 (1|18:18)");
    }

    #[test]
    fn try_fail_binds_the_error() {
        assert_eq!(
            sexp("try { f() } fail e { e }"),
            json!(["block", [[
                "try",
                ["call", ["id", "f", true], []],
                ["id", "e", true],
                ["id", "e", true],
                null,
                null
            ]], []])
        );
    }

    #[test]
    fn branches_default_to_the_innermost_loop() {
        assert_eq!(
            sexp("loop { break }"),
            json!(["block", [["loop", ["break", 0], null, null, null, null]], []])
        );
    }

    #[test]
    fn branch_levels_target_outer_loops() {
        assert_eq!(
            sexp("loop { break 1 }"),
            json!(["block", [["loop", ["break", 1], null, null, null, null]], []])
        );
    }
}
