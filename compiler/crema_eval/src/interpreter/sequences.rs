//! Lazy loop execution.
//!
//! Loops evaluate to sequence values; this module runs them. Each
//! pull executes iterations until one produces a non-`none` value,
//! inside a frame rebuilt from the scope list captured at the loop.
//!
//! Pull outcomes follow the loop's branches: a failing condition or
//! an exhausted iterable yields the then branch as the final element,
//! `break` yields the else branch as the final element, `continue`
//! moves on, and `redo` re-runs the body with the same element.

use crate::environment::LocalScope;
use crate::flow::{Exec, Flow, Signal};
use crate::sequence::{LoopSequence, SeqKind, ValueIter};
use crate::value::Value;
use crema_ir::ExprId;

use super::Interpreter;

/// Outcome of one loop iteration body.
enum LoopStep {
    Yield(Value),
    CondFailed,
}

impl<'a> Interpreter<'a> {
    pub(super) fn make_loop(
        &mut self,
        always: Option<ExprId>,
        cond: Option<ExprId>,
        body: Option<ExprId>,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    ) -> Value {
        let kind = SeqKind::Loop { always, cond, body, then_branch, else_branch };
        Value::Sequence(LocalScope::new(LoopSequence::new(kind, self.env.capture())))
    }

    pub(super) fn make_for(
        &mut self,
        binding: ExprId,
        iterable: ExprId,
        body: ExprId,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    ) -> Value {
        let kind = SeqKind::For {
            binding,
            iterable,
            body,
            then_branch,
            else_branch,
            iter: None,
            pending: None,
        };
        Value::Sequence(LocalScope::new(LoopSequence::new(kind, self.env.capture())))
    }

    /// Pull the next element of a sequence, or `None` once exhausted.
    ///
    /// The sequence's state is taken out of its cell for the duration
    /// of the step, so a re-entrant pull of the same sequence from
    /// inside the loop body observes an empty sequence instead of
    /// panicking on a double borrow.
    pub(crate) fn seq_next(&mut self, seq: &LocalScope<LoopSequence>) -> Exec<Option<Value>> {
        let (scopes, mut kind) = {
            let mut state = seq.borrow_mut();
            if state.done || matches!(state.kind, SeqKind::Taken) {
                return Ok(None);
            }
            (
                state.scopes.clone(),
                std::mem::replace(&mut state.kind, SeqKind::Taken),
            )
        };

        self.env.push_frame(None, scopes);
        let outcome = self.seq_step(&mut kind);
        self.env.pop_frame();

        let mut state = seq.borrow_mut();
        state.kind = kind;
        match outcome {
            Ok((value, finished)) => {
                if finished {
                    state.done = true;
                }
                Ok(value)
            }
            Err(flow) => {
                state.done = true;
                Err(flow)
            }
        }
    }

    /// Collect a value's elements eagerly, for spreads and
    /// destructuring.
    pub(crate) fn value_to_vec(&mut self, value: Value) -> Exec<Vec<Value>> {
        let mut iter = ValueIter::over(value).map_err(|k| self.raise(k))?;
        let mut out = Vec::new();
        while let Some(item) = iter.next(self)? {
            out.push(item);
        }
        Ok(out)
    }

    fn seq_step(&mut self, kind: &mut SeqKind) -> Exec<(Option<Value>, bool)> {
        match kind {
            SeqKind::Loop { always, cond, body, then_branch, else_branch } => {
                let (always, cond, body) = (*always, *cond, *body);
                let (th, el) = (*then_branch, *else_branch);
                loop {
                    match self.loop_iteration(always, cond, body) {
                        Ok(LoopStep::Yield(Value::None)) => continue,
                        Ok(LoopStep::Yield(value)) => return Ok((Some(value), false)),
                        Ok(LoopStep::CondFailed) => return self.final_branch(th),
                        Err(Flow::Signal(Signal::Break(0))) => return self.final_branch(el),
                        Err(Flow::Signal(Signal::Continue(0) | Signal::Redo(0))) => continue,
                        Err(Flow::Signal(signal)) => return Err(demote(signal)),
                        Err(other) => return Err(other),
                    }
                }
            }
            SeqKind::For {
                binding,
                iterable,
                body,
                then_branch,
                else_branch,
                iter,
                pending,
            } => {
                let (binding, iterable, body) = (*binding, *iterable, *body);
                let (th, el) = (*then_branch, *else_branch);
                if iter.is_none() {
                    let value = self.eval(iterable)?;
                    *iter = Some(ValueIter::over(value).map_err(|k| self.raise(k))?);
                }
                let Some(it) = iter.as_mut() else {
                    return Ok((None, true));
                };
                loop {
                    let item = match pending.take() {
                        Some(item) => item,
                        None => match it.next(self)? {
                            Some(item) => item,
                            None => return self.final_branch(th),
                        },
                    };
                    let place = self.place(binding)?;
                    place.set(self, item.clone())?;
                    match self.eval(body).and_then(|v| self.settle(v)) {
                        Ok(Value::None) => continue,
                        Ok(value) => return Ok((Some(value), false)),
                        Err(Flow::Signal(Signal::Break(0))) => return self.final_branch(el),
                        Err(Flow::Signal(Signal::Continue(0))) => continue,
                        Err(Flow::Signal(Signal::Redo(0))) => {
                            *pending = Some(item);
                            continue;
                        }
                        Err(Flow::Signal(signal)) => return Err(demote(signal)),
                        Err(other) => return Err(other),
                    }
                }
            }
            SeqKind::Items(iter) => match iter.next(self)? {
                Some(value) => Ok((Some(value), false)),
                None => Ok((None, true)),
            },
            SeqKind::Taken => Ok((None, true)),
        }
    }

    /// One pass of a condition loop: the always part, then the gated
    /// body.
    fn loop_iteration(
        &mut self,
        always: Option<ExprId>,
        cond: Option<ExprId>,
        body: Option<ExprId>,
    ) -> Exec<LoopStep> {
        let mut value = Value::None;
        if let Some(id) = always {
            let v = self.eval(id)?;
            value = self.settle(v)?;
        }
        if let Some(id) = cond {
            let test = self.eval(id)?;
            if !test.truthy() {
                return Ok(LoopStep::CondFailed);
            }
            if let Some(id) = body {
                let v = self.eval(id)?;
                value = self.settle(v)?;
            }
        }
        Ok(LoopStep::Yield(value))
    }

    /// A loop-ending branch becomes the sequence's final element,
    /// unless it produces `none`.
    fn final_branch(&mut self, branch: Option<ExprId>) -> Exec<(Option<Value>, bool)> {
        let value = self.eval_opt(branch)?;
        let value = self.settle(value)?;
        match value {
            Value::None => Ok((None, true)),
            value => Ok((Some(value), true)),
        }
    }
}

/// Signals targeting an outer loop lose one level crossing this one.
fn demote(signal: Signal) -> Flow {
    Flow::Signal(match signal {
        Signal::Break(level) => Signal::Break(level - 1),
        Signal::Continue(level) => Signal::Continue(level - 1),
        Signal::Redo(level) => Signal::Redo(level - 1),
        other => other,
    })
}
