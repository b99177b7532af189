//! Lazy loop sequences and value iteration.
//!
//! A loop in value position evaluates to a [`LoopSequence`]: no
//! iteration runs until something pulls on it. Each pull executes at
//! most one yielding iteration inside a frame rebuilt from the scope
//! list captured where the loop appeared. Sequences are single-pass;
//! once exhausted they stay exhausted.

use crate::environment::{LocalScope, Scope};
use crate::errors::{not_iterable, EvalErrorKind};
use crate::flow::Exec;
use crate::interpreter::Interpreter;
use crate::value::Value;
use crema_ir::ExprId;

/// Iteration state over a concrete value.
///
/// List iteration holds the live handle and an index, so mutation
/// during iteration is observed rather than snapshotted. Strings and
/// object keys snapshot up front.
pub enum ValueIter {
    Range { next: i64, end: i64 },
    List { items: LocalScope<Vec<Value>>, index: usize },
    Tuple { items: std::rc::Rc<[Value]>, index: usize },
    Chars { chars: Vec<char>, index: usize },
    Keys { keys: Vec<Value>, index: usize },
    Sequence(LocalScope<LoopSequence>),
}

impl ValueIter {
    /// Build an iterator over `value`, or report what is not iterable.
    pub fn over(value: Value) -> Result<ValueIter, EvalErrorKind> {
        Ok(match value {
            Value::Range(a, b) => ValueIter::Range { next: a, end: b },
            Value::List(items) => ValueIter::List { items, index: 0 },
            Value::Tuple(items) => ValueIter::Tuple { items, index: 0 },
            Value::Str(s) => ValueIter::Chars {
                chars: s.chars().collect(),
                index: 0,
            },
            Value::Object(obj) => ValueIter::Keys {
                keys: obj.borrow().entries.iter().map(|(k, _)| k.clone()).collect(),
                index: 0,
            },
            Value::Sequence(seq) => ValueIter::Sequence(seq),
            other => return Err(not_iterable(other.type_name())),
        })
    }

    /// The next element, or `None` when exhausted. Takes the
    /// interpreter because sequence-backed iterators run loop bodies.
    pub fn next(&mut self, interp: &mut Interpreter<'_>) -> Exec<Option<Value>> {
        Ok(match self {
            ValueIter::Range { next, end } => {
                if *next < *end {
                    let v = Value::Int(*next);
                    *next += 1;
                    Some(v)
                } else {
                    None
                }
            }
            ValueIter::List { items, index } => {
                let v = items.borrow().get(*index).cloned();
                if v.is_some() {
                    *index += 1;
                }
                v
            }
            ValueIter::Tuple { items, index } => {
                let v = items.get(*index).cloned();
                if v.is_some() {
                    *index += 1;
                }
                v
            }
            ValueIter::Chars { chars, index } => {
                let v = chars.get(*index).map(|c| Value::str(c.to_string()));
                if v.is_some() {
                    *index += 1;
                }
                v
            }
            ValueIter::Keys { keys, index } => {
                let v = keys.get(*index).cloned();
                if v.is_some() {
                    *index += 1;
                }
                v
            }
            ValueIter::Sequence(seq) => return interp.seq_next(&seq.clone()),
        })
    }
}

/// What a sequence runs per pull.
pub enum SeqKind {
    /// A condition loop: `always` runs first each iteration, then the
    /// condition gates the body. `while` populates only `cond`/`body`.
    Loop {
        always: Option<ExprId>,
        cond: Option<ExprId>,
        body: Option<ExprId>,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    },
    /// A `for` loop. The iterator materializes on the first pull;
    /// `pending` re-queues the current element after a `redo`.
    For {
        binding: ExprId,
        iterable: ExprId,
        body: ExprId,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
        iter: Option<ValueIter>,
        pending: Option<Value>,
    },
    /// A plain value iteration, from the `iter` builtin.
    Items(ValueIter),
    /// Placeholder while a pull is in flight; a re-entrant pull of the
    /// same sequence observes this and yields nothing.
    Taken,
}

/// A lazy, single-pass sequence value.
pub struct LoopSequence {
    pub(crate) kind: SeqKind,
    pub(crate) scopes: Vec<LocalScope<Scope>>,
    pub(crate) done: bool,
}

impl LoopSequence {
    pub(crate) fn new(kind: SeqKind, scopes: Vec<LocalScope<Scope>>) -> Self {
        LoopSequence { kind, scopes, done: false }
    }
}
