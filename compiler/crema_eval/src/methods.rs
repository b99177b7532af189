//! Member access on values: fields, indexing, and built-in methods.
//!
//! Reads are permissive: a missing key, an out-of-range index, or any
//! member of `none` yields `none`, which is what makes `a.b.c` chains
//! safe to write without guards. Writes are strict and report real
//! errors.

use crate::errors::{cannot_set_member, index_out_of_range, not_iterable, EvalErrorKind};
use crate::flow::Exec;
use crate::interpreter::Interpreter;
use crate::value::{Builtin, Value};

/// Resolve a possibly negative index against `len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { index + len } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

/// `object.key` and `object.(expr)` reads.
pub fn member_get(object: &Value, key: &Value) -> Result<Value, EvalErrorKind> {
    let found = match object {
        // The sentinel absorbs member access.
        Value::None => Some(Value::None),
        Value::Object(obj) => obj.borrow().get(key).or_else(|| match key {
            Value::Str(name) if &**name == "length" => {
                Some(Value::Int(obj.borrow().entries.len() as i64))
            }
            _ => None,
        }),
        Value::List(items) => match key {
            Value::Int(i) => resolve_index(*i, items.borrow().len())
                .map(|i| items.borrow()[i].clone()),
            Value::Str(name) => list_member(name, items.borrow().len()),
            _ => None,
        },
        Value::Tuple(items) => match key {
            Value::Int(i) => resolve_index(*i, items.len()).map(|i| items[i].clone()),
            Value::Str(name) if &**name == "length" => Some(Value::Int(items.len() as i64)),
            _ => None,
        },
        Value::Str(s) => match key {
            Value::Int(i) => {
                let chars: Vec<char> = s.chars().collect();
                resolve_index(*i, chars.len()).map(|i| Value::str(chars[i].to_string()))
            }
            Value::Str(name) if &**name == "length" => {
                Some(Value::Int(s.chars().count() as i64))
            }
            _ => None,
        },
        Value::Range(a, b) => match key {
            Value::Int(i) => {
                resolve_index(*i, (b - a).max(0) as usize).map(|i| Value::Int(a + i as i64))
            }
            Value::Str(name) if &**name == "length" => Some(Value::Int((b - a).max(0))),
            _ => None,
        },
        Value::Instance(inst) => match key {
            Value::Str(name) => {
                let inst = inst.borrow();
                inst.fields
                    .get(&**name)
                    .cloned()
                    .or_else(|| inst.proto.public_member(name))
            }
            _ => None,
        },
        Value::Proto(proto) => match key {
            Value::Str(name) => proto.public_member(name),
            _ => None,
        },
        _ => None,
    };
    Ok(found.unwrap_or(Value::None))
}

/// `object.key = value` writes.
pub fn member_set(object: &Value, key: Value, value: Value) -> Result<(), EvalErrorKind> {
    match object {
        Value::Object(obj) => {
            obj.borrow_mut().set(key, value);
            Ok(())
        }
        Value::List(items) => match key {
            Value::Int(i) => {
                let mut items = items.borrow_mut();
                let len = items.len();
                match resolve_index(i, len) {
                    Some(slot) => {
                        items[slot] = value;
                        Ok(())
                    }
                    None => Err(index_out_of_range(i, len)),
                }
            }
            _ => Err(cannot_set_member("list")),
        },
        Value::Instance(inst) => match key {
            // Setting an undeclared field extends the instance.
            Value::Str(name) => {
                inst.borrow_mut().fields.insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(cannot_set_member("instance")),
        },
        other => Err(cannot_set_member(other.type_name())),
    }
}

fn list_member(name: &str, len: usize) -> Option<Value> {
    let method = |name: &'static str, call: crate::value::BuiltinFn| {
        Some(Value::Builtin(Builtin { name, call }))
    };
    match name {
        "length" => Some(Value::Int(len as i64)),
        "push" => method("push", list_push),
        "pop" => method("pop", list_pop),
        "push_front" => method("push_front", list_push_front),
        "pop_front" => method("pop_front", list_pop_front),
        "join" => method("join", list_join),
        _ => None,
    }
}

fn receiver_list(
    interp: &Interpreter<'_>,
    this: Option<Value>,
) -> Exec<crate::environment::LocalScope<Vec<Value>>> {
    match this {
        Some(Value::List(items)) => Ok(items),
        other => Err(interp.raise(not_iterable(
            other.as_ref().map_or("none", Value::type_name),
        ))),
    }
}

fn list_push(interp: &mut Interpreter<'_>, this: Option<Value>, args: Vec<Value>) -> Exec<Value> {
    let items = receiver_list(interp, this)?;
    items.borrow_mut().extend(args);
    Ok(Value::None)
}

fn list_pop(interp: &mut Interpreter<'_>, this: Option<Value>, _args: Vec<Value>) -> Exec<Value> {
    let items = receiver_list(interp, this)?;
    let popped = items.borrow_mut().pop();
    Ok(popped.unwrap_or(Value::None))
}

fn list_push_front(
    interp: &mut Interpreter<'_>,
    this: Option<Value>,
    args: Vec<Value>,
) -> Exec<Value> {
    let items = receiver_list(interp, this)?;
    let mut items = items.borrow_mut();
    for (i, arg) in args.into_iter().enumerate() {
        items.insert(i, arg);
    }
    Ok(Value::None)
}

fn list_pop_front(
    interp: &mut Interpreter<'_>,
    this: Option<Value>,
    _args: Vec<Value>,
) -> Exec<Value> {
    let items = receiver_list(interp, this)?;
    let mut items = items.borrow_mut();
    if items.is_empty() {
        Ok(Value::None)
    } else {
        Ok(items.remove(0))
    }
}

fn list_join(interp: &mut Interpreter<'_>, this: Option<Value>, args: Vec<Value>) -> Exec<Value> {
    let items = receiver_list(interp, this)?;
    let sep = match args.first() {
        Some(v) => v.to_string(),
        None => String::new(),
    };
    let joined = items
        .borrow()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&sep);
    Ok(Value::str(joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_members_read_as_none() {
        let obj = Value::Object(Default::default());
        assert_eq!(
            member_get(&obj, &Value::str("ghost")).expect("get"),
            Value::None
        );
        assert_eq!(
            member_get(&Value::None, &Value::str("anything")).expect("get"),
            Value::None
        );
    }

    #[test]
    fn list_indexing_wraps_negatives_and_absorbs_overflow() {
        let list = Value::list(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(member_get(&list, &Value::Int(-1)).expect("get"), Value::Int(20));
        assert_eq!(member_get(&list, &Value::Int(9)).expect("get"), Value::None);
    }

    #[test]
    fn lengths_cover_strings_lists_and_ranges() {
        assert_eq!(
            member_get(&Value::str("abc"), &Value::str("length")).expect("get"),
            Value::Int(3)
        );
        assert_eq!(
            member_get(&Value::Range(2, 7), &Value::str("length")).expect("get"),
            Value::Int(5)
        );
    }

    #[test]
    fn out_of_range_writes_are_errors() {
        let list = Value::list(vec![Value::Int(1)]);
        assert_eq!(
            member_set(&list, Value::Int(3), Value::Int(9)),
            Err(EvalErrorKind::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn object_writes_insert_or_replace() {
        let obj = Value::Object(Default::default());
        member_set(&obj, Value::str("k"), Value::Int(1)).expect("set");
        member_set(&obj, Value::str("k"), Value::Int(2)).expect("set");
        assert_eq!(member_get(&obj, &Value::str("k")).expect("get"), Value::Int(2));
    }
}
