//! The tree-walking interpreter.
//!
//! One `eval` entry point dispatching on node kind; assignment
//! targets go through [`place::Place`] so compound assignment
//! evaluates its target once. Control flow, calls, and lazy loop
//! sequences live in the submodules.

mod call;
mod control;
mod place;
mod sequences;

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::builtins;
use crate::environment::{Environment, Mutability, Scope};
use crate::errors::{undefined_variable, EvalError, EvalErrorKind};
use crate::flow::{Exec, Flow, Signal};
use crate::methods;
use crate::operators;
use crate::print_handler::PrintHandler;
use crate::value::{BoundMethod, FunctionValue, ObjectValue, Value};
use crema_ir::{Ast, BranchKind, ExprId, ExprKind, FormatPart, HoistedDecl, Literal, OpKind};

pub struct Interpreter<'a> {
    ast: &'a Ast,
    pub(crate) env: Environment,
    print: Rc<PrintHandler>,
}

impl<'a> Interpreter<'a> {
    pub fn new(ast: &'a Ast, print: Rc<PrintHandler>) -> Self {
        Self::with_globals(ast, builtins::default_globals(), print)
    }

    /// Build an interpreter whose outermost scope is `globals` instead
    /// of the default global set.
    pub fn with_globals(ast: &'a Ast, globals: Scope, print: Rc<PrintHandler>) -> Self {
        Interpreter {
            ast,
            env: Environment::new(globals),
            print,
        }
    }

    /// Evaluate a program root to completion.
    pub fn run(&mut self, root: ExprId) -> Result<Value, EvalError> {
        tracing::debug!(exprs = self.ast.expr_count(), "starting evaluation");
        match self.eval(root) {
            Ok(value) => Ok(value),
            Err(flow) => Err(flow.into_error(self.env.trace())),
        }
    }

    /// Wrap an error kind with the current call stack.
    pub(crate) fn raise(&self, kind: EvalErrorKind) -> Flow {
        Flow::Error(EvalError::new(kind, self.env.trace()))
    }

    pub(crate) fn print_line(&self, line: &str) {
        self.print.println(line);
    }

    /// Evaluate a node for its value.
    pub(crate) fn eval(&mut self, id: ExprId) -> Exec<Value> {
        let ast = self.ast;
        if let Some(origin) = ast.origin(id) {
            self.env.set_line(origin.line);
        }
        match ast.kind(id) {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::Ident { name, .. } => self
                .env
                .lookup(name)
                .ok_or_else(|| self.raise(undefined_variable(name))),
            ExprKind::Block { stmts, hoisted } => self.eval_block(stmts, hoisted),
            ExprKind::Assign { target, value, op } => self.eval_assign(*target, *value, *op),
            ExprKind::Tuple(elems) => {
                let items = self.eval_spreadable(elems)?;
                Ok(Value::Tuple(items.into()))
            }
            ExprKind::List(elems) => {
                let items = self.eval_spreadable(elems)?;
                Ok(Value::list(items))
            }
            ExprKind::Object(entries) => self.eval_object(entries),
            ExprKind::Op { op, operands } => self.eval_op(*op, operands),
            ExprKind::Call { callee, args } => self.eval_call(*callee, args),
            ExprKind::Index { object, subscripts } => {
                let mut current = self.eval(*object)?;
                for &sub in subscripts {
                    let key = self.eval(sub)?;
                    current =
                        methods::member_get(&current, &key).map_err(|k| self.raise(k))?;
                }
                Ok(current)
            }
            ExprKind::Bind { object, member } => {
                let receiver = self.eval(*object)?;
                let key = self.eval(*member)?;
                let target =
                    methods::member_get(&receiver, &key).map_err(|k| self.raise(k))?;
                Ok(Value::Bound(Rc::new(BoundMethod { receiver, target })))
            }
            ExprKind::Descope { object, member } => {
                let obj = self.eval(*object)?;
                let key = self.eval(*member)?;
                Ok(self.descope_get(&obj, &key))
            }
            ExprKind::If { cond, then_branch, else_branch } => {
                self.eval_if(*cond, *then_branch, *else_branch)
            }
            ExprKind::Switch { scrutinee, cases, default, then_branch, else_branch } => {
                self.eval_switch(*scrutinee, cases, *default, *then_branch, *else_branch)
            }
            ExprKind::Try { body, binding, handler, then_branch, else_branch } => {
                self.eval_try(*body, *binding, *handler, *then_branch, *else_branch)
            }
            ExprKind::Loop { always, cond, body, then_branch, else_branch } => {
                Ok(self.make_loop(*always, *cond, *body, *then_branch, *else_branch))
            }
            ExprKind::ForLoop { binding, iterable, body, then_branch, else_branch } => {
                Ok(self.make_for(*binding, *iterable, *body, *then_branch, *else_branch))
            }
            ExprKind::Branch { kind, level } => Err(Flow::Signal(match kind {
                BranchKind::Break => Signal::Break(*level),
                BranchKind::Continue => Signal::Continue(*level),
                BranchKind::Redo => Signal::Redo(*level),
            })),
            ExprKind::Return(value) => {
                let v = self.eval(*value)?;
                Err(Flow::Signal(Signal::Return(v)))
            }
            ExprKind::Fail(value) => {
                let v = self.eval(*value)?;
                Err(Flow::Signal(Signal::Fail(v)))
            }
            ExprKind::After { value, update } => {
                let v = self.eval(*value)?;
                self.eval(*update)?;
                Ok(v)
            }
            ExprKind::Format(parts) => self.eval_format(parts),
            ExprKind::Function { name, params, body } => {
                Ok(Value::Function(Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: *body,
                    captured: self.env.capture(),
                })))
            }
            ExprKind::Proto { name, parent, public, private, statics } => {
                self.eval_proto(name.clone(), *parent, public, private, statics)
            }
            ExprKind::Import(name) => self.eval_import(*name),
            ExprKind::Spread(_) => Err(self.raise(EvalErrorKind::StraySpread)),
        }
    }

    /// Evaluate an optional branch; absent branches are `none`.
    pub(crate) fn eval_opt(&mut self, id: Option<ExprId>) -> Exec<Value> {
        match id {
            Some(id) => self.eval(id),
            None => Ok(Value::None),
        }
    }

    /// A statement's final value: lazy sequences drain here, so loops
    /// in statement position run for their effects.
    pub(crate) fn settle(&mut self, value: Value) -> Exec<Value> {
        if let Value::Sequence(seq) = value {
            while self.seq_next(&seq)?.is_some() {}
            Ok(Value::None)
        } else {
            Ok(value)
        }
    }

    /// Push a block scope pre-bound with the block's hoisted names.
    pub(crate) fn scoped(&mut self, hoisted: &[HoistedDecl]) -> ScopedInterpreter<'_, 'a> {
        self.env.push_scope();
        for decl in hoisted {
            self.env
                .define(&decl.name, Value::None, Mutability::from_flag(decl.mutable));
        }
        ScopedInterpreter { interp: self }
    }

    fn eval_block(&mut self, stmts: &[ExprId], hoisted: &[HoistedDecl]) -> Exec<Value> {
        let mut scope = self.scoped(hoisted);
        let mut result = Value::None;
        for &stmt in stmts {
            let value = scope.eval(stmt)?;
            result = scope.settle(value)?;
        }
        Ok(result)
    }

    fn eval_object(&mut self, entries: &[(ExprId, ExprId)]) -> Exec<Value> {
        let mut object = ObjectValue::default();
        for &(key_id, value_id) in entries {
            let key = self.eval(key_id)?;
            let value = self.eval(value_id)?;
            object.set(key, value);
        }
        Ok(Value::Object(crate::environment::LocalScope::new(object)))
    }

    fn eval_op(&mut self, op: OpKind, operands: &[ExprId]) -> Exec<Value> {
        // && and || evaluate their right side only when needed and
        // yield the deciding operand, not a bool.
        if let (OpKind::And | OpKind::Or, [left, right]) = (op, operands) {
            let l = self.eval(*left)?;
            let take_right = (op == OpKind::Or) != l.truthy();
            return if take_right { self.eval(*right) } else { Ok(l) };
        }
        match operands {
            [operand] => {
                let v = self.eval(*operand)?;
                operators::evaluate_unary(op, &v).map_err(|k| self.raise(k))
            }
            [left, rest @ ..] => {
                let mut acc = self.eval(*left)?;
                for &next in rest {
                    let rhs = self.eval(next)?;
                    acc = operators::evaluate_binary(op, &acc, &rhs)
                        .map_err(|k| self.raise(k))?;
                }
                Ok(acc)
            }
            [] => Ok(Value::None),
        }
    }

    fn eval_format(&mut self, parts: &[FormatPart]) -> Exec<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                FormatPart::Text(text) => out.push_str(text),
                FormatPart::Expr(expr) => {
                    let v = self.eval(*expr)?;
                    out.push_str(&v.to_string());
                }
            }
        }
        Ok(Value::str(out))
    }

    /// Spread-aware element evaluation for tuples, lists, and call
    /// arguments.
    pub(crate) fn eval_spreadable(&mut self, elems: &[ExprId]) -> Exec<Vec<Value>> {
        let ast = self.ast;
        let mut out = Vec::with_capacity(elems.len());
        for &elem in elems {
            if let ExprKind::Spread(inner) = ast.kind(elem) {
                let value = self.eval(*inner)?;
                out.extend(self.value_to_vec(value)?);
            } else {
                out.push(self.eval(elem)?);
            }
        }
        Ok(out)
    }

    /// `obj::member`: static partition lookup, walking the parent
    /// chain. Misses read as `none` like every other member access.
    fn descope_get(&self, object: &Value, key: &Value) -> Value {
        let name = key.to_string();
        let found = match object {
            Value::None => Some(Value::None),
            Value::Proto(proto) => proto.static_member(&name),
            Value::Instance(inst) => inst.borrow().proto.static_member(&name),
            _ => None,
        };
        found.unwrap_or(Value::None)
    }

    /// `import 'name'` resolves the name against the builtin globals.
    fn eval_import(&mut self, name: ExprId) -> Exec<Value> {
        let value = self.eval(name)?;
        let name = value.to_string();
        self.env
            .builtin(&name)
            .ok_or_else(|| self.raise(EvalErrorKind::UnknownImport(name)))
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::None => Value::None,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(s) => Value::str(s.as_str()),
    }
}

/// RAII guard pairing a pushed block scope with its pop.
pub(crate) struct ScopedInterpreter<'i, 'a> {
    interp: &'i mut Interpreter<'a>,
}

impl<'a> Deref for ScopedInterpreter<'_, 'a> {
    type Target = Interpreter<'a>;

    fn deref(&self) -> &Self::Target {
        self.interp
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interp
    }
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interp.env.pop_scope();
    }
}
