//! Assignment targets.
//!
//! An l-value expression evaluates once into a [`Place`]; compound
//! assignment then reads and writes through the same place, so a
//! subscript like `xs[i++] += 1` evaluates `i++` a single time.

use crate::environment::{LocalScope, Mutability, Scope};
use crate::errors::{assign_to_constant, undefined_variable, EvalErrorKind};
use crate::flow::Exec;
use crate::methods::{member_get, member_set};
use crate::value::Value;
use crema_ir::{ExprId, ExprKind, OpKind};

use super::Interpreter;

pub(crate) enum Place {
    /// A named binding in a resolved scope. `via_decl` marks targets
    /// produced by declarations, whose first write may land on an
    /// immutable binding.
    Var {
        scope: LocalScope<Scope>,
        name: String,
        via_decl: bool,
    },
    Member {
        object: Value,
        key: Value,
    },
    Tuple(Vec<PlaceItem>),
}

pub(crate) enum PlaceItem {
    One(Place),
    /// A spread target collecting the remaining values into a list.
    Rest(Place),
}

impl Place {
    pub(crate) fn get(&self, interp: &mut Interpreter<'_>) -> Exec<Value> {
        match self {
            Place::Var { scope, name, .. } => {
                let value = scope.borrow().get(name).map(|b| b.value.clone());
                value.ok_or_else(|| interp.raise(undefined_variable(name)))
            }
            Place::Member { object, key } => {
                member_get(object, key).map_err(|k| interp.raise(k))
            }
            Place::Tuple(_) => {
                Err(interp.raise(EvalErrorKind::InvalidAssignTarget("tuple")))
            }
        }
    }

    pub(crate) fn set(&self, interp: &mut Interpreter<'_>, value: Value) -> Exec<()> {
        match self {
            Place::Var { scope, name, via_decl } => {
                let frozen = {
                    let mut s = scope.borrow_mut();
                    match s.get_mut(name) {
                        Some(binding) => {
                            if binding.mutability.is_mutable() || *via_decl {
                                binding.value = value;
                                false
                            } else {
                                true
                            }
                        }
                        None => {
                            // First write to an undeclared name defines it.
                            s.define(name, value, Mutability::Mutable);
                            false
                        }
                    }
                };
                if frozen {
                    return Err(interp.raise(assign_to_constant(name)));
                }
                Ok(())
            }
            Place::Member { object, key } => {
                member_set(object, key.clone(), value).map_err(|k| interp.raise(k))
            }
            Place::Tuple(items) => interp.destructure(items, value),
        }
    }
}

impl<'a> Interpreter<'a> {
    pub(crate) fn eval_assign(
        &mut self,
        target: ExprId,
        value: ExprId,
        op: Option<OpKind>,
    ) -> Exec<Value> {
        let place = self.place(target)?;
        let rhs = self.eval(value)?;
        let result = match op {
            None => rhs,
            Some(op) => {
                let current = place.get(self)?;
                crate::operators::evaluate_binary(op, &current, &rhs)
                    .map_err(|k| self.raise(k))?
            }
        };
        place.set(self, result.clone())?;
        Ok(result)
    }

    /// Evaluate an l-value expression into its place.
    pub(crate) fn place(&mut self, id: ExprId) -> Exec<Place> {
        let ast = self.ast;
        if !ast.caps(id).lvalue {
            return Err(self.raise(EvalErrorKind::InvalidAssignTarget(kind_name(ast.kind(id)))));
        }
        match ast.kind(id) {
            ExprKind::Ident { name, mutable } => {
                let scope = self
                    .env
                    .resolve(name)
                    .unwrap_or_else(|| self.env.innermost());
                Ok(Place::Var {
                    scope,
                    name: name.clone(),
                    via_decl: !*mutable,
                })
            }
            ExprKind::Index { object, subscripts } => {
                let Some((last, front)) = subscripts.split_last() else {
                    return Err(self.raise(EvalErrorKind::InvalidAssignTarget("index")));
                };
                let mut obj = self.eval(*object)?;
                for &sub in front {
                    let key = self.eval(sub)?;
                    obj = member_get(&obj, &key).map_err(|k| self.raise(k))?;
                }
                let key = self.eval(*last)?;
                Ok(Place::Member { object: obj, key })
            }
            ExprKind::Tuple(elems) => {
                let mut items = Vec::with_capacity(elems.len());
                for &elem in elems {
                    if let ExprKind::Spread(inner) = ast.kind(elem) {
                        items.push(PlaceItem::Rest(self.place(*inner)?));
                    } else {
                        items.push(PlaceItem::One(self.place(elem)?));
                    }
                }
                Ok(Place::Tuple(items))
            }
            ExprKind::Spread(inner) => self.place(*inner),
            other => Err(self.raise(EvalErrorKind::InvalidAssignTarget(kind_name(other)))),
        }
    }

    /// Distribute a value across tuple targets. Missing values bind
    /// `none`, surplus values are dropped, and a spread target takes
    /// whatever the fixed targets leave over.
    pub(crate) fn destructure(&mut self, items: &[PlaceItem], value: Value) -> Exec<()> {
        let values = self.value_to_vec(value)?;
        let rest_at = items
            .iter()
            .position(|item| matches!(item, PlaceItem::Rest(_)));

        let fixed = rest_at.unwrap_or(items.len());
        for (i, item) in items[..fixed].iter().enumerate() {
            if let PlaceItem::One(place) = item {
                place.set(self, values.get(i).cloned().unwrap_or(Value::None))?;
            }
        }
        if let Some(idx) = rest_at {
            let trailing = items.len() - idx - 1;
            let rest_end = values.len().saturating_sub(trailing).max(idx);
            if let PlaceItem::Rest(place) = &items[idx] {
                let rest: Vec<Value> = values
                    .get(idx..rest_end)
                    .map(<[Value]>::to_vec)
                    .unwrap_or_default();
                place.set(self, Value::list(rest))?;
            }
            for (offset, item) in items[idx + 1..].iter().enumerate() {
                if let PlaceItem::One(place) = item {
                    let v = values.get(rest_end + offset).cloned().unwrap_or(Value::None);
                    place.set(self, v)?;
                }
            }
        }
        Ok(())
    }
}

fn kind_name(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Literal(_) => "a literal",
        ExprKind::Call { .. } => "a call result",
        ExprKind::Op { .. } => "an operator result",
        ExprKind::Assign { .. } => "an assignment result",
        ExprKind::Tuple(_) => "this tuple",
        _ => "this expression",
    }
}
