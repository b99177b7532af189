//! Calls, user functions, and prototypes.
//!
//! The call convention is permissive: missing arguments bind `none`,
//! surplus arguments are dropped. A call through member access passes
//! the accessed object as `this`.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::environment::{LocalScope, Mutability};
use crate::errors::{invalid_conversion, not_callable, undefined_variable, EvalErrorKind};
use crate::flow::{Exec, Flow, Signal};
use crate::methods::member_get;
use crate::value::{FunctionValue, Instance, ProtoValue, Value};
use crema_ir::{ExprId, ExprKind, ProtoMember};

use super::Interpreter;

impl<'a> Interpreter<'a> {
    pub(super) fn eval_call(&mut self, callee: ExprId, args: &[ExprId]) -> Exec<Value> {
        let ast = self.ast;
        let (func, this) = match ast.kind(callee) {
            // obj.m(...) and obj->m(...) call with obj as receiver.
            ExprKind::Index { object, subscripts } => {
                let Some((last, front)) = subscripts.split_last() else {
                    return Err(self.raise(not_callable("none")));
                };
                let mut obj = self.eval(*object)?;
                for &sub in front {
                    let key = self.eval(sub)?;
                    obj = member_get(&obj, &key).map_err(|k| self.raise(k))?;
                }
                let key = self.eval(*last)?;
                let func = member_get(&obj, &key).map_err(|k| self.raise(k))?;
                (func, Some(obj))
            }
            ExprKind::Bind { object, member } => {
                let obj = self.eval(*object)?;
                let key = self.eval(*member)?;
                let func = member_get(&obj, &key).map_err(|k| self.raise(k))?;
                (func, Some(obj))
            }
            _ => (self.eval(callee)?, None),
        };
        let argv = self.eval_spreadable(args)?;
        self.call_value(func, this, argv)
    }

    pub(crate) fn call_value(
        &mut self,
        func: Value,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Exec<Value> {
        match func {
            Value::Function(f) => self.call_function(&f, this, args),
            Value::Builtin(b) => (b.call)(self, this, args),
            Value::Bound(bound) => {
                self.call_value(bound.target.clone(), Some(bound.receiver.clone()), args)
            }
            Value::Proto(proto) => self.instantiate(&proto, args),
            other => Err(self.raise(not_callable(other.type_name()))),
        }
    }

    fn call_function(
        &mut self,
        func: &FunctionValue,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Exec<Value> {
        self.env.push_frame(func.name.clone(), func.captured.clone());
        self.env.push_scope();
        if let Some(receiver) = this {
            self.env.define("this", receiver, Mutability::Immutable);
        }
        let out = match self.bind_params(&func.params, &args) {
            Ok(()) => self.eval(func.body),
            Err(flow) => Err(flow),
        };
        self.env.pop_frame();
        match out {
            Err(Flow::Signal(Signal::Return(value))) => Ok(value),
            other => other,
        }
    }

    fn bind_params(&mut self, params: &[ExprId], args: &[Value]) -> Exec<()> {
        let ast = self.ast;
        for (i, &param) in params.iter().enumerate() {
            match ast.kind(param) {
                ExprKind::Ident { name, .. } => {
                    let value = args.get(i).cloned().unwrap_or(Value::None);
                    self.env.define(name, value, Mutability::Mutable);
                }
                // A trailing spread parameter collects the surplus.
                ExprKind::Spread(inner) => {
                    let ExprKind::Ident { name, .. } = ast.kind(*inner) else {
                        return Err(
                            self.raise(EvalErrorKind::InvalidAssignTarget("this parameter"))
                        );
                    };
                    let rest: Vec<Value> = args.iter().skip(i).cloned().collect();
                    self.env.define(name, Value::list(rest), Mutability::Mutable);
                    break;
                }
                _ => {
                    return Err(self.raise(EvalErrorKind::InvalidAssignTarget("this parameter")))
                }
            }
        }
        Ok(())
    }

    pub(super) fn eval_proto(
        &mut self,
        name: Option<String>,
        parent: Option<ExprId>,
        public: &[ProtoMember],
        private: &[ProtoMember],
        statics: &[ProtoMember],
    ) -> Exec<Value> {
        let parent = match parent {
            Some(id) => {
                let value = self.eval(id)?;
                Some(self.resolve_proto(value)?)
            }
            None => None,
        };
        let public = self.eval_members(public)?;
        let private = self.eval_members(private)?;
        let statics = LocalScope::new(self.eval_members(statics)?);
        Ok(Value::Proto(Rc::new(ProtoValue {
            name,
            parent,
            public,
            private,
            statics,
        })))
    }

    /// A parent clause names its proto; a bare name resolves through
    /// the environment.
    fn resolve_proto(&mut self, value: Value) -> Exec<Rc<ProtoValue>> {
        match value {
            Value::Proto(proto) => Ok(proto),
            Value::Str(name) => match self.env.lookup(&name) {
                Some(Value::Proto(proto)) => Ok(proto),
                Some(other) => {
                    Err(self.raise(invalid_conversion(other.type_name(), "a parent proto")))
                }
                None => Err(self.raise(undefined_variable(&name))),
            },
            other => Err(self.raise(invalid_conversion(other.type_name(), "a parent proto"))),
        }
    }

    fn eval_members(&mut self, members: &[ProtoMember]) -> Exec<FxHashMap<String, Value>> {
        let mut map = FxHashMap::default();
        for member in members {
            let value = match member.value {
                Some(id) => self.eval(id)?,
                None => Value::None,
            };
            map.insert(member.name.clone(), value);
        }
        Ok(map)
    }

    /// Calling a proto constructs an instance: every declared member
    /// down the parent chain seeds the field map, then a `new` method,
    /// if declared, runs as the constructor.
    fn instantiate(&mut self, proto: &Rc<ProtoValue>, args: Vec<Value>) -> Exec<Value> {
        let instance = Value::Instance(LocalScope::new(Instance {
            proto: proto.clone(),
            fields: seed_fields(proto),
        }));
        if let Some(ctor) = proto.public_member("new") {
            self.call_value(ctor, Some(instance.clone()), args)?;
        }
        Ok(instance)
    }
}

fn seed_fields(proto: &Rc<ProtoValue>) -> FxHashMap<String, Value> {
    let mut fields = match &proto.parent {
        Some(parent) => seed_fields(parent),
        None => FxHashMap::default(),
    };
    for (name, value) in proto.public.iter().chain(proto.private.iter()) {
        fields.insert(name.clone(), value.clone());
    }
    fields
}
