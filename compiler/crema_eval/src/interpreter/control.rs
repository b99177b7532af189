//! Conditionals, switches, and failure handling.

use crate::flow::{Exec, Flow, Signal};
use crate::operators;
use crate::value::Value;
use crema_ir::{CaseId, CaseOp, ExprId};

use super::Interpreter;

impl<'a> Interpreter<'a> {
    pub(super) fn eval_if(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    ) -> Exec<Value> {
        let test = self.eval(cond)?;
        if test.truthy() {
            self.eval(then_branch)
        } else {
            self.eval_opt(else_branch)
        }
    }

    /// Switch semantics: scan cases in source order for a match (by
    /// equality or membership), fall back to the default, then run the
    /// selected case and every linked fallthrough case after it,
    /// re-evaluating each body. `break` exits to the else branch,
    /// `continue` to the then branch, either becoming the value.
    pub(super) fn eval_switch(
        &mut self,
        scrutinee: ExprId,
        cases: &[CaseId],
        default: Option<CaseId>,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    ) -> Exec<Value> {
        let ast = self.ast;
        let subject = self.eval(scrutinee)?;

        let mut selected = None;
        for &case_id in cases {
            if Some(case_id) == default {
                continue;
            }
            let case = ast.case(case_id);
            let Some(value_id) = case.value else { continue };
            let candidate = self.eval(value_id)?;
            let hit = match case.op {
                CaseOp::Eq => subject == candidate,
                CaseOp::In => operators::contains(&candidate, &subject)
                    .map_err(|k| self.raise(k))?,
                CaseOp::Else => false,
            };
            if hit {
                selected = Some(case_id);
                break;
            }
        }

        let mut current = selected.or(default);
        let mut result = Value::None;
        while let Some(case_id) = current {
            let case = ast.case(case_id);
            match self.eval(case.body) {
                Ok(value) => result = self.settle(value)?,
                Err(Flow::Signal(Signal::Break(0))) => return self.eval_opt(else_branch),
                Err(Flow::Signal(Signal::Continue(0))) => return self.eval_opt(then_branch),
                Err(other) => return Err(other),
            }
            current = case.next;
        }
        // A chain that runs off its end still triggers the then
        // branch, for effect only.
        self.eval_opt(then_branch)?;
        Ok(result)
    }

    /// `try B fail e H`: a `fail` raised in the body binds its payload
    /// and runs the handler. Semantic errors are catchable too; the
    /// handler sees their message. The then branch replaces the value
    /// on success, the else branch after a handled failure.
    pub(super) fn eval_try(
        &mut self,
        body: ExprId,
        binding: ExprId,
        handler: ExprId,
        then_branch: Option<ExprId>,
        else_branch: Option<ExprId>,
    ) -> Exec<Value> {
        match self.eval(body) {
            Ok(value) => {
                let value = self.settle(value)?;
                match then_branch {
                    Some(id) => self.eval(id),
                    None => Ok(value),
                }
            }
            Err(Flow::Signal(Signal::Fail(payload))) => {
                self.handle_failure(payload, binding, handler, else_branch)
            }
            Err(Flow::Error(err)) => {
                let payload = Value::str(err.kind.to_string());
                self.handle_failure(payload, binding, handler, else_branch)
            }
            Err(other) => Err(other),
        }
    }

    fn handle_failure(
        &mut self,
        payload: Value,
        binding: ExprId,
        handler: ExprId,
        else_branch: Option<ExprId>,
    ) -> Exec<Value> {
        let place = self.place(binding)?;
        place.set(self, payload)?;
        let result = self.eval(handler)?;
        let result = self.settle(result)?;
        match else_branch {
            Some(id) => self.eval(id),
            None => Ok(result),
        }
    }
}
