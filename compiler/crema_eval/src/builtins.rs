//! Default global bindings.
//!
//! The names every program starts with: the literal-like constants
//! (`none`, `true`, `false`, `inf`, `nan`) and the native functions.
//! All of them are ordinary immutable bindings in the outermost
//! scope, so user code may shadow them in inner blocks.

use crate::environment::{LocalScope, Mutability, Scope};
use crate::errors::{invalid_conversion, not_iterable};
use crate::flow::Exec;
use crate::interpreter::Interpreter;
use crate::sequence::{LoopSequence, SeqKind, ValueIter};
use crate::value::{Builtin, Value};

/// The scope seeding a fresh interpreter.
pub fn default_globals() -> Scope {
    let mut scope = Scope::new();
    let mut set = |name: &str, value: Value| {
        scope.define(name, value, Mutability::Immutable);
    };

    set("none", Value::None);
    set("true", Value::Bool(true));
    set("false", Value::Bool(false));
    set("inf", Value::Float(f64::INFINITY));
    set("nan", Value::Float(f64::NAN));

    let natives: [(&'static str, crate::value::BuiltinFn); 7] = [
        ("print", print),
        ("iter", iter),
        ("next", next),
        ("char", char_of),
        ("str", str_of),
        ("int", int_of),
        ("type", type_of),
    ];
    for (name, call) in natives {
        set(name, Value::Builtin(Builtin { name, call }));
    }

    scope
}

fn print(interp: &mut Interpreter<'_>, _this: Option<Value>, args: Vec<Value>) -> Exec<Value> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interp.print_line(&line);
    Ok(Value::None)
}

/// Wrap any iterable value as a pullable sequence.
fn iter(interp: &mut Interpreter<'_>, _this: Option<Value>, mut args: Vec<Value>) -> Exec<Value> {
    let value = take_arg(&mut args);
    // A sequence is already its own iterator.
    if let Value::Sequence(_) = value {
        return Ok(value);
    }
    let it = ValueIter::over(value).map_err(|kind| interp.raise(kind))?;
    Ok(Value::Sequence(LocalScope::new(LoopSequence::new(
        SeqKind::Items(it),
        Vec::new(),
    ))))
}

/// Pull one element; `none` when the sequence is exhausted.
fn next(interp: &mut Interpreter<'_>, _this: Option<Value>, mut args: Vec<Value>) -> Exec<Value> {
    match take_arg(&mut args) {
        Value::Sequence(seq) => Ok(interp.seq_next(&seq)?.unwrap_or(Value::None)),
        other => Err(interp.raise(not_iterable(other.type_name()))),
    }
}

fn char_of(interp: &mut Interpreter<'_>, _this: Option<Value>, mut args: Vec<Value>) -> Exec<Value> {
    match take_arg(&mut args) {
        Value::Int(n) => u32::try_from(n)
            .ok()
            .and_then(char::from_u32)
            .map(|c| Value::str(c.to_string()))
            .ok_or_else(|| interp.raise(invalid_conversion("int", "character"))),
        other => Err(interp.raise(invalid_conversion(other.type_name(), "character"))),
    }
}

fn str_of(_interp: &mut Interpreter<'_>, _this: Option<Value>, mut args: Vec<Value>) -> Exec<Value> {
    Ok(Value::str(take_arg(&mut args).to_string()))
}

fn int_of(interp: &mut Interpreter<'_>, _this: Option<Value>, mut args: Vec<Value>) -> Exec<Value> {
    let value = take_arg(&mut args);
    match &value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Int(*x as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| interp.raise(invalid_conversion("string", "int"))),
        other => Err(interp.raise(invalid_conversion(other.type_name(), "int"))),
    }
}

fn type_of(_interp: &mut Interpreter<'_>, _this: Option<Value>, mut args: Vec<Value>) -> Exec<Value> {
    Ok(Value::str(take_arg(&mut args).type_name()))
}

/// Builtins follow the language's permissive call convention: a
/// missing argument is `none`.
fn take_arg(args: &mut Vec<Value>) -> Value {
    if args.is_empty() {
        Value::None
    } else {
        args.remove(0)
    }
}
