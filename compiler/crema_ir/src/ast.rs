//! Expression arena and node variants.
//!
//! Nodes are stored in a flat arena and referenced by [`ExprId`] indices
//! rather than boxes; children are ids in a fixed per-kind order (the
//! same order the s-expression form serializes them in).

use crate::{OpKind, Origin};

/// Index of an expression in the [`Ast`] arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a switch case in the [`Ast`] arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CaseId(u32);

impl CaseId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Capability flags, fixed at construction by node kind.
///
/// A node that is not l-value capable must never reach the "evaluate as
/// assignment target" path, and vice versa for r-values; the evaluator
/// checks both dynamically and raises a semantic error on violation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Caps {
    pub lvalue: bool,
    pub rvalue: bool,
}

impl Caps {
    const RVALUE: Caps = Caps { lvalue: false, rvalue: true };
    const BOTH: Caps = Caps { lvalue: true, rvalue: true };
}

/// Literal constant.
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Direction of a `break`/`continue`/`redo` branch.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BranchKind {
    Break,
    Continue,
    Redo,
}

impl BranchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Redo => "redo",
        }
    }
}

/// One part of an interpolated string.
#[derive(Clone, PartialEq, Debug)]
pub enum FormatPart {
    Text(String),
    Expr(ExprId),
}

/// A name hoisted to the top of its enclosing block.
///
/// Produced by the parser's declaration bookkeeping; the evaluator
/// pre-binds each hoisted name to none before the block's first
/// statement runs.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HoistedDecl {
    pub name: String,
    pub mutable: bool,
}

/// One member of a proto partition.
///
/// A plain field has no value; a method carries the id of its
/// `Function` node.
#[derive(Clone, PartialEq, Debug)]
pub struct ProtoMember {
    pub name: String,
    pub value: Option<ExprId>,
}

/// Comparison mode of a switch case.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CaseOp {
    /// `case v:` matches by value equality.
    Eq,
    /// `case in v:` matches by membership.
    In,
    /// `else:` default case.
    Else,
}

impl CaseOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseOp::Eq => "=",
            CaseOp::In => "in",
            CaseOp::Else => "else",
        }
    }
}

/// A switch case clause.
///
/// `next` is the fallthrough link: set once during parsing for cases
/// whose separator was `:`, pointing at the immediately following case
/// in the same switch. `=>` cases keep `next = None`.
#[derive(Clone, PartialEq, Debug)]
pub struct Case {
    pub op: CaseOp,
    pub value: Option<ExprId>,
    pub body: ExprId,
    pub falls_through: bool,
    pub next: Option<CaseId>,
    pub origin: Option<Origin>,
}

/// Expression node: kind, capability flags, optional source origin.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub caps: Caps,
    pub origin: Option<Origin>,
}

/// Expression variants.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    Literal(Literal),
    Ident {
        name: String,
        mutable: bool,
    },
    Spread(ExprId),
    Assign {
        target: ExprId,
        value: ExprId,
        op: Option<OpKind>,
    },
    Tuple(Vec<ExprId>),
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Index {
        object: ExprId,
        subscripts: Vec<ExprId>,
    },
    /// `obj->member`: member access binding `obj` as the receiver.
    Bind {
        object: ExprId,
        member: ExprId,
    },
    /// `obj::member`: static-partition member access.
    Descope {
        object: ExprId,
        member: ExprId,
    },
    /// Unified loop node. `always` runs each iteration before the
    /// condition; `while c B` desugars to `cond + body` with no
    /// `always` part, `loop A while c B` populates both.
    Loop {
        always: Option<ExprId>,
        cond: Option<ExprId>,
        body: Option<ExprId>,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    },
    If {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    },
    Branch {
        kind: BranchKind,
        level: u32,
    },
    Op {
        op: OpKind,
        operands: Vec<ExprId>,
    },
    Import(ExprId),
    Proto {
        name: Option<String>,
        parent: Option<ExprId>,
        public: Vec<ProtoMember>,
        private: Vec<ProtoMember>,
        statics: Vec<ProtoMember>,
    },
    Return(ExprId),
    Fail(ExprId),
    Format(Vec<FormatPart>),
    Switch {
        scrutinee: ExprId,
        /// Cases in source order, the default included in its position
        /// so fallthrough links and serialization stay faithful. The
        /// match scan skips the entry equal to `default`.
        cases: Vec<CaseId>,
        default: Option<CaseId>,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    },
    Object(Vec<(ExprId, ExprId)>),
    List(Vec<ExprId>),
    ForLoop {
        binding: ExprId,
        iterable: ExprId,
        body: ExprId,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    },
    Block {
        stmts: Vec<ExprId>,
        hoisted: Vec<HoistedDecl>,
    },
    Function {
        name: Option<String>,
        params: Vec<ExprId>,
        body: ExprId,
    },
    /// `x++` / `x--`: evaluate `value`, run `update`, yield the
    /// pre-update value.
    After {
        value: ExprId,
        update: ExprId,
    },
    Try {
        body: ExprId,
        binding: ExprId,
        handler: ExprId,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    },
}

/// Flat expression/case arena.
#[derive(Clone, Default, Debug)]
pub struct Ast {
    exprs: Vec<Expr>,
    cases: Vec<Case>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    /// Allocate a node, computing its capability flags from its kind.
    pub fn alloc(&mut self, kind: ExprKind, origin: Option<Origin>) -> ExprId {
        let caps = self.caps_for(&kind);
        let id = ExprId(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(Expr { kind, caps, origin });
        id
    }

    /// Allocate a switch case. `next` starts unset; the parser patches
    /// it once via [`Ast::set_case_next`] while linking fallthrough
    /// chains.
    pub fn alloc_case(&mut self, case: Case) -> CaseId {
        let id = CaseId(u32::try_from(self.cases.len()).unwrap_or(u32::MAX));
        self.cases.push(case);
        id
    }

    /// Patch a case's fallthrough link. The one permitted post-build
    /// mutation.
    pub fn set_case_next(&mut self, id: CaseId, next: Option<CaseId>) {
        self.cases[id.index()].next = next;
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()].kind
    }

    #[inline]
    pub fn caps(&self, id: ExprId) -> Caps {
        self.exprs[id.index()].caps
    }

    #[inline]
    pub fn origin(&self, id: ExprId) -> Option<Origin> {
        self.exprs[id.index()].origin
    }

    #[inline]
    pub fn case(&self, id: CaseId) -> &Case {
        &self.cases[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    fn caps_for(&self, kind: &ExprKind) -> Caps {
        match kind {
            ExprKind::Ident { .. } | ExprKind::Index { .. } => Caps::BOTH,
            ExprKind::Spread(inner) => self.caps(*inner),
            ExprKind::Tuple(elems) => Caps {
                lvalue: elems.iter().all(|e| self.caps(*e).lvalue),
                rvalue: elems.iter().all(|e| self.caps(*e).rvalue),
            },
            _ => Caps::RVALUE,
        }
    }
}

/// A parsed program: the arena plus the root block.
#[derive(Clone, Debug)]
pub struct Program {
    pub ast: Ast,
    pub root: ExprId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literals_are_rvalue_only() {
        let mut ast = Ast::new();
        let id = ast.alloc(ExprKind::Literal(Literal::Int(1)), None);
        assert_eq!(ast.caps(id), Caps { lvalue: false, rvalue: true });
    }

    #[test]
    fn identifiers_are_both() {
        let mut ast = Ast::new();
        let id = ast.alloc(
            ExprKind::Ident { name: "x".into(), mutable: true },
            None,
        );
        assert!(ast.caps(id).lvalue);
        assert!(ast.caps(id).rvalue);
    }

    #[test]
    fn tuple_lvalue_iff_all_elements_lvalue() {
        let mut ast = Ast::new();
        let a = ast.alloc(ExprKind::Ident { name: "a".into(), mutable: true }, None);
        let b = ast.alloc(ExprKind::Ident { name: "b".into(), mutable: true }, None);
        let lit = ast.alloc(ExprKind::Literal(Literal::Int(3)), None);

        let good = ast.alloc(ExprKind::Tuple(vec![a, b]), None);
        assert!(ast.caps(good).lvalue);

        let bad = ast.alloc(ExprKind::Tuple(vec![a, lit]), None);
        assert!(!ast.caps(bad).lvalue);
    }

    #[test]
    fn assignment_results_are_rvalue_only() {
        let mut ast = Ast::new();
        let x = ast.alloc(ExprKind::Ident { name: "x".into(), mutable: true }, None);
        let one = ast.alloc(ExprKind::Literal(Literal::Int(1)), None);
        let assign = ast.alloc(
            ExprKind::Assign { target: x, value: one, op: None },
            None,
        );
        assert!(!ast.caps(assign).lvalue);
        assert!(ast.caps(assign).rvalue);
    }
}
