//! Operator kinds shared by the parser and evaluator.

use std::fmt;

/// Operator of an [`crate::ExprKind::Op`] node.
///
/// Unary uses are encoded by operand count, not by a separate kind:
/// `Op(Sub, [x])` is negation, `Op(Sub, [x, y])` is subtraction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Range,
    Not,
    BitNot,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Same,
    NotSame,
    Lt,
    Le,
    Gt,
    Ge,
    Cmp,
    In,
    Is,
    Has,
}

impl OpKind {
    /// The surface syntax of this operator, also its s-expression tag.
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Add => "+",
            OpKind::Sub => "-",
            OpKind::Mul => "*",
            OpKind::Div => "/",
            OpKind::FloorDiv => "//",
            OpKind::Mod => "%",
            OpKind::Pow => "**",
            OpKind::Range => "..",
            OpKind::Not => "!",
            OpKind::BitNot => "~",
            OpKind::BitAnd => "&",
            OpKind::BitOr => "|",
            OpKind::BitXor => "^",
            OpKind::Shl => "<<",
            OpKind::Shr => ">>",
            OpKind::And => "&&",
            OpKind::Or => "||",
            OpKind::Xor => "^^",
            OpKind::Eq => "==",
            OpKind::Ne => "!=",
            OpKind::Same => "===",
            OpKind::NotSame => "!==",
            OpKind::Lt => "<",
            OpKind::Le => "<=",
            OpKind::Gt => ">",
            OpKind::Ge => ">=",
            OpKind::Cmp => "<>",
            OpKind::In => "in",
            OpKind::Is => "is",
            OpKind::Has => "has",
        }
    }

    /// Inverse of [`OpKind::as_str`], used by the deserializer.
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "+" => OpKind::Add,
            "-" => OpKind::Sub,
            "*" => OpKind::Mul,
            "/" => OpKind::Div,
            "//" => OpKind::FloorDiv,
            "%" => OpKind::Mod,
            "**" => OpKind::Pow,
            ".." => OpKind::Range,
            "!" => OpKind::Not,
            "~" => OpKind::BitNot,
            "&" => OpKind::BitAnd,
            "|" => OpKind::BitOr,
            "^" => OpKind::BitXor,
            "<<" => OpKind::Shl,
            ">>" => OpKind::Shr,
            "&&" => OpKind::And,
            "||" => OpKind::Or,
            "^^" => OpKind::Xor,
            "==" => OpKind::Eq,
            "!=" => OpKind::Ne,
            "===" => OpKind::Same,
            "!==" => OpKind::NotSame,
            "<" => OpKind::Lt,
            "<=" => OpKind::Le,
            ">" => OpKind::Gt,
            ">=" => OpKind::Ge,
            "<>" => OpKind::Cmp,
            "in" => OpKind::In,
            "is" => OpKind::Is,
            "has" => OpKind::Has,
            _ => return None,
        })
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
