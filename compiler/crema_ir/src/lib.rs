//! AST model for the Crema language.
//!
//! The parser produces a [`Program`]: an expression arena plus the id of
//! the root block. Nodes are immutable once built, with one exception:
//! the `next` fallthrough link of switch cases, which the parser patches
//! exactly once after collecting a switch body.
//!
//! Every node carries two capability flags fixed at construction
//! ([`Caps`]): whether it may be evaluated as an assignment target and
//! whether it may be read for its value. The evaluator checks these
//! dynamically on both evaluation paths.

mod ast;
mod operators;
mod origin;
pub mod sexp;

pub use ast::{
    Ast, BranchKind, Case, CaseId, CaseOp, Caps, Expr, ExprId, ExprKind, FormatPart, HoistedDecl,
    Literal, Program, ProtoMember,
};
pub use operators::OpKind;
pub use origin::Origin;
