//! Evaluation errors and their constructors.
//!
//! Every runtime failure funnels through [`EvalErrorKind`]; the
//! interpreter attaches a call-stack trace when it raises one, so
//! constructors here stay trace-free and callers never format
//! messages by hand.

use std::fmt;

use thiserror::Error;

/// What went wrong, without location context.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum EvalErrorKind {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("Assignment to constant '{0}'")]
    AssignToConstant(String),

    #[error("Cannot assign to {0}")]
    InvalidAssignTarget(&'static str),

    #[error("'{0}' value is not callable")]
    NotCallable(&'static str),

    #[error("'{0}' value is not iterable")]
    NotIterable(&'static str),

    #[error("Unsupported operand types for '{op}': '{lhs}' and '{rhs}'")]
    BinaryTypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Unsupported operand type for unary '{op}': '{operand}'")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow in '{0}'")]
    IntegerOverflow(&'static str),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Cannot set member on '{0}' value")]
    CannotSetMember(&'static str),

    #[error("Cannot convert '{from}' to {to}")]
    InvalidConversion { from: &'static str, to: &'static str },

    #[error("Spread used outside a sequence context")]
    StraySpread,

    #[error("'{0}' outside of any enclosing construct")]
    StraySignal(&'static str),

    #[error("Unknown import '{0}'")]
    UnknownImport(String),

    /// An uncaught `fail`, carrying the payload's textual form.
    #[error("{0}")]
    Failure(String),
}

/// A runtime failure with the call stack at the point of the raise.
///
/// One trace line per live frame, outermost first, listing the names
/// bound in each of the frame's block scopes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub trace: Vec<String>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, trace: Vec<String>) -> Self {
        EvalError { kind, trace }
    }

    /// An error with no frame context, for failures raised outside a
    /// running interpreter.
    pub fn bare(kind: EvalErrorKind) -> Self {
        EvalError { kind, trace: Vec::new() }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.trace.is_empty() {
            write!(f, "\nTraceback")?;
            for line in &self.trace {
                write!(f, "\n  {line}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Constructors, so call sites read as prose.

pub fn undefined_variable(name: &str) -> EvalErrorKind {
    EvalErrorKind::UndefinedVariable(name.to_owned())
}

pub fn assign_to_constant(name: &str) -> EvalErrorKind {
    EvalErrorKind::AssignToConstant(name.to_owned())
}

pub fn not_callable(type_name: &'static str) -> EvalErrorKind {
    EvalErrorKind::NotCallable(type_name)
}

pub fn not_iterable(type_name: &'static str) -> EvalErrorKind {
    EvalErrorKind::NotIterable(type_name)
}

pub fn binary_type_mismatch(
    op: &'static str,
    lhs: &'static str,
    rhs: &'static str,
) -> EvalErrorKind {
    EvalErrorKind::BinaryTypeMismatch { op, lhs, rhs }
}

pub fn unary_type_mismatch(op: &'static str, operand: &'static str) -> EvalErrorKind {
    EvalErrorKind::UnaryTypeMismatch { op, operand }
}

pub fn division_by_zero() -> EvalErrorKind {
    EvalErrorKind::DivisionByZero
}

pub fn integer_overflow(op: &'static str) -> EvalErrorKind {
    EvalErrorKind::IntegerOverflow(op)
}

pub fn index_out_of_range(index: i64, len: usize) -> EvalErrorKind {
    EvalErrorKind::IndexOutOfRange { index, len }
}

pub fn cannot_set_member(type_name: &'static str) -> EvalErrorKind {
    EvalErrorKind::CannotSetMember(type_name)
}

pub fn invalid_conversion(from: &'static str, to: &'static str) -> EvalErrorKind {
    EvalErrorKind::InvalidConversion { from, to }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn errors_render_their_trace_indented() {
        let err = EvalError::new(
            undefined_variable("x"),
            vec!["global (line 1): [{f}]".into(), "f (line 3): [{y}]".into()],
        );
        assert_eq!(
            err.to_string(),
            "Undefined variable 'x'\nTraceback\n  global (line 1): [{f}]\n  f (line 3): [{y}]"
        );
    }

    #[test]
    fn bare_errors_render_without_a_traceback() {
        let err = EvalError::bare(division_by_zero());
        assert_eq!(err.to_string(), "Division by zero");
    }
}
