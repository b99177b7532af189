//! Non-local control flow.
//!
//! Branches, returns, and failures travel the same `Result` error
//! channel as real errors, so `?` unwinds them through intermediate
//! expressions until a construct that handles them catches the signal.

use crate::errors::{EvalError, EvalErrorKind};
use crate::value::Value;

/// A control-flow signal in flight.
///
/// Branch levels count enclosing loops outward: level 0 targets the
/// innermost loop, each loop that sees a higher level decrements it
/// and re-raises.
#[derive(Clone, Debug)]
pub enum Signal {
    Break(u32),
    Continue(u32),
    Redo(u32),
    Return(Value),
    Fail(Value),
}

impl Signal {
    /// Surface keyword of the signal, for stray-signal diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            Signal::Break(_) => "break",
            Signal::Continue(_) => "continue",
            Signal::Redo(_) => "redo",
            Signal::Return(_) => "return",
            Signal::Fail(_) => "fail",
        }
    }
}

/// Why evaluation of an expression did not produce a value.
#[derive(Clone, Debug)]
pub enum Flow {
    Signal(Signal),
    Error(EvalError),
}

impl From<EvalError> for Flow {
    fn from(err: EvalError) -> Self {
        Flow::Error(err)
    }
}

/// Result of evaluating one expression.
pub type Exec<T> = Result<T, Flow>;

impl Flow {
    /// Convert an escaped flow into the error a caller reports.
    ///
    /// Signals that reach the program boundary are programming errors;
    /// an uncaught `fail` keeps its payload's textual form.
    pub fn into_error(self, trace: Vec<String>) -> EvalError {
        match self {
            Flow::Error(err) => err,
            Flow::Signal(Signal::Fail(payload)) => {
                EvalError::new(EvalErrorKind::Failure(payload.to_string()), trace)
            }
            Flow::Signal(signal) => {
                EvalError::new(EvalErrorKind::StraySignal(signal.keyword()), trace)
            }
        }
    }
}
