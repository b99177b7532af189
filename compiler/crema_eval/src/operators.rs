//! Binary and unary operator implementations.
//!
//! Direct enum dispatch over a fixed value set; the interpreter owns
//! short-circuiting (`&&`, `||`) and membership over lazy sequences,
//! everything else lands here. Errors come back as bare kinds and the
//! caller attaches the trace.
//!
//! The absent-value sentinel participates in arithmetic: `none + x`
//! is `x`, `none - x` negates, and comparisons treat it as zero. With
//! a string operand `none` concatenates as its textual form.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::errors::{
    binary_type_mismatch, division_by_zero, integer_overflow, unary_type_mismatch, EvalErrorKind,
};
use crate::value::Value;
use crema_ir::OpKind;

type OpResult = Result<Value, EvalErrorKind>;

fn mismatch(op: OpKind, l: &Value, r: &Value) -> EvalErrorKind {
    binary_type_mismatch(op.as_str(), l.type_name(), r.type_name())
}

/// Python-style floored division.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Modulo with the divisor's sign.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        Value::None => Some(0.0),
        _ => None,
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`, `<>`. Numbers (with `none` as
/// zero) and strings order; anything else does not.
fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            let (a, b) = (as_float(l)?, as_float(r)?);
            a.partial_cmp(&b)
        }
    }
}

fn concat(l: &Value, r: &Value) -> Value {
    Value::str(format!("{l}{r}"))
}

fn repeat_str(s: &str, n: i64) -> Value {
    if n <= 0 {
        Value::str("")
    } else {
        Value::str(s.repeat(n as usize))
    }
}

pub fn evaluate_binary(op: OpKind, left: &Value, right: &Value) -> OpResult {
    use Value::{Float, Int, List, Str};

    match op {
        OpKind::Add => match (left, right) {
            (Str(_), _) | (_, Str(_)) => Ok(concat(left, right)),
            (Value::None, other) | (other, Value::None) => Ok(other.clone()),
            (Int(a), Int(b)) => a
                .checked_add(*b)
                .map(Int)
                .ok_or_else(|| integer_overflow("+")),
            (List(a), List(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::list(items))
            }
            _ => numeric(op, left, right, |a, b| a + b),
        },
        OpKind::Sub => match (left, right) {
            (Value::None, other) => evaluate_unary(OpKind::Sub, other),
            (other, Value::None) => Ok(other.clone()),
            (Int(a), Int(b)) => a
                .checked_sub(*b)
                .map(Int)
                .ok_or_else(|| integer_overflow("-")),
            _ => numeric(op, left, right, |a, b| a - b),
        },
        OpKind::Mul => match (left, right) {
            (Str(s), Int(n)) | (Int(n), Str(s)) => Ok(repeat_str(s, *n)),
            (List(items), Int(n)) | (Int(n), List(items)) => {
                let items = items.borrow();
                let mut out = Vec::new();
                for _ in 0..(*n).max(0) {
                    out.extend(items.iter().cloned());
                }
                Ok(Value::list(out))
            }
            (Int(a), Int(b)) => a
                .checked_mul(*b)
                .map(Int)
                .ok_or_else(|| integer_overflow("*")),
            _ => numeric(op, left, right, |a, b| a * b),
        },
        // True division: always a float, like the original runtime.
        OpKind::Div => {
            let (a, b) = both_floats(op, left, right)?;
            if b == 0.0 {
                Err(division_by_zero())
            } else {
                Ok(Float(a / b))
            }
        }
        OpKind::FloorDiv => match (left, right) {
            (Int(_), Int(0)) => Err(division_by_zero()),
            (Int(a), Int(b)) => floor_div(*a, *b)
                .map(Int)
                .ok_or_else(|| integer_overflow("//")),
            _ => {
                let (a, b) = both_floats(op, left, right)?;
                if b == 0.0 {
                    Err(division_by_zero())
                } else {
                    Ok(Float((a / b).floor()))
                }
            }
        },
        OpKind::Mod => match (left, right) {
            (Int(_), Int(0)) => Err(division_by_zero()),
            (Int(a), Int(b)) => Ok(Int(floor_mod(*a, *b))),
            _ => {
                let (a, b) = both_floats(op, left, right)?;
                if b == 0.0 {
                    Err(division_by_zero())
                } else {
                    Ok(Float(a.rem_euclid(b)))
                }
            }
        },
        OpKind::Pow => match (left, right) {
            (Int(a), Int(b)) if *b >= 0 => u32::try_from(*b)
                .ok()
                .and_then(|e| a.checked_pow(e))
                .map(Int)
                .ok_or_else(|| integer_overflow("**")),
            _ => {
                let (a, b) = both_floats(op, left, right)?;
                Ok(Float(a.powf(b)))
            }
        },
        OpKind::Range => match (left, right) {
            (Int(a), Int(b)) => Ok(Value::Range(*a, *b)),
            _ => Err(mismatch(op, left, right)),
        },
        OpKind::BitAnd => ints(op, left, right, |a, b| a & b),
        OpKind::BitOr => ints(op, left, right, |a, b| a | b),
        OpKind::BitXor => ints(op, left, right, |a, b| a ^ b),
        OpKind::Shl => ints(op, left, right, |a, b| a.wrapping_shl(b as u32)),
        OpKind::Shr => ints(op, left, right, |a, b| a.wrapping_shr(b as u32)),
        OpKind::Xor => Ok(Value::Bool(left.truthy() != right.truthy())),
        OpKind::Eq => Ok(Value::Bool(left == right)),
        OpKind::Ne => Ok(Value::Bool(left != right)),
        OpKind::Same => Ok(Value::Bool(left.same(right))),
        OpKind::NotSame => Ok(Value::Bool(!left.same(right))),
        OpKind::Lt | OpKind::Le | OpKind::Gt | OpKind::Ge => {
            let ord = compare(left, right).ok_or_else(|| mismatch(op, left, right))?;
            Ok(Value::Bool(match op {
                OpKind::Lt => ord == Ordering::Less,
                OpKind::Le => ord != Ordering::Greater,
                OpKind::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        // Three-way comparison: -1, 0, or 1.
        OpKind::Cmp => {
            let ord = compare(left, right).ok_or_else(|| mismatch(op, left, right))?;
            Ok(Int(match ord {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            }))
        }
        OpKind::In => contains(right, left).map(Value::Bool),
        OpKind::Is => Ok(Value::Bool(is_value(left, right))),
        OpKind::Has => has_member(left, right),
        // Short-circuiting pairs never reach value dispatch; `!` and
        // `~` are unary-only.
        OpKind::And | OpKind::Or | OpKind::Not | OpKind::BitNot => {
            Err(mismatch(op, left, right))
        }
    }
}

pub fn evaluate_unary(op: OpKind, operand: &Value) -> OpResult {
    match (op, operand) {
        (OpKind::Not, v) => Ok(Value::Bool(!v.truthy())),
        (OpKind::Sub, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("-")),
        (OpKind::Sub, Value::Float(x)) => Ok(Value::Float(-x)),
        (OpKind::Sub, Value::None) | (OpKind::Add, Value::None) => Ok(Value::None),
        (OpKind::Add, Value::Int(n)) => Ok(Value::Int(*n)),
        (OpKind::Add, Value::Float(x)) => Ok(Value::Float(*x)),
        (OpKind::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        (op, v) => Err(unary_type_mismatch(op.as_str(), v.type_name())),
    }
}

fn numeric(op: OpKind, l: &Value, r: &Value, f: fn(f64, f64) -> f64) -> OpResult {
    let (a, b) = both_floats(op, l, r)?;
    Ok(Value::Float(f(a, b)))
}

fn both_floats(op: OpKind, l: &Value, r: &Value) -> Result<(f64, f64), EvalErrorKind> {
    match (as_float(l), as_float(r)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, l, r)),
    }
}

fn ints(op: OpKind, l: &Value, r: &Value, f: fn(i64, i64) -> i64) -> OpResult {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(f(*a, *b))),
        _ => Err(mismatch(op, l, r)),
    }
}

/// Membership for `x in c` and `case in` clauses.
pub fn contains(container: &Value, item: &Value) -> Result<bool, EvalErrorKind> {
    match container {
        Value::List(items) => Ok(items.borrow().iter().any(|v| v == item)),
        Value::Tuple(items) => Ok(items.iter().any(|v| v == item)),
        Value::Str(s) => match item {
            Value::Str(needle) => Ok(s.contains(&**needle)),
            _ => Err(binary_type_mismatch("in", item.type_name(), "string")),
        },
        Value::Object(obj) => Ok(obj.borrow().contains(item)),
        Value::Range(a, b) => match item {
            Value::Int(n) => Ok(n >= a && n < b),
            _ => Ok(false),
        },
        _ => Err(binary_type_mismatch(
            "in",
            item.type_name(),
            container.type_name(),
        )),
    }
}

/// `a is b`: identity, or instance-of when `b` is a proto.
fn is_value(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Instance(inst), Value::Proto(proto)) => inst.borrow().derives_from(proto),
        (Value::Proto(child), Value::Proto(parent)) => {
            let mut current = Some(child);
            while let Some(p) = current {
                if Rc::ptr_eq(p, parent) {
                    return true;
                }
                current = p.parent.as_ref();
            }
            false
        }
        _ => l.same(r),
    }
}

/// `obj has 'name'`: declared-member check by name.
fn has_member(l: &Value, r: &Value) -> OpResult {
    let Value::Str(name) = r else {
        return Err(binary_type_mismatch("has", l.type_name(), r.type_name()));
    };
    let found = match l {
        Value::Object(obj) => obj.borrow().contains(&Value::Str(name.clone())),
        Value::Instance(inst) => {
            let inst = inst.borrow();
            inst.fields.contains_key(&**name) || inst.proto.has_member(name)
        }
        Value::Proto(proto) => proto.has_member(name),
        _ => false,
    };
    Ok(Value::Bool(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bin(op: OpKind, l: Value, r: Value) -> Value {
        evaluate_binary(op, &l, &r).expect("operator")
    }

    #[test]
    fn addition_promotes_and_concatenates() {
        assert_eq!(bin(OpKind::Add, Value::Int(1), Value::Int(2)), Value::Int(3));
        assert_eq!(
            bin(OpKind::Add, Value::Int(1), Value::Float(0.5)),
            Value::Float(1.5)
        );
        assert_eq!(
            bin(OpKind::Add, Value::str("a"), Value::Int(1)),
            Value::str("a1")
        );
    }

    #[test]
    fn none_is_neutral_for_addition_and_subtraction() {
        assert_eq!(bin(OpKind::Add, Value::None, Value::Int(5)), Value::Int(5));
        assert_eq!(bin(OpKind::Sub, Value::Int(5), Value::None), Value::Int(5));
        assert_eq!(bin(OpKind::Sub, Value::None, Value::Int(5)), Value::Int(-5));
        assert_eq!(
            bin(OpKind::Add, Value::None, Value::str("x")),
            Value::str("nonex")
        );
    }

    #[test]
    fn division_is_true_division() {
        assert_eq!(
            bin(OpKind::Div, Value::Int(7), Value::Int(2)),
            Value::Float(3.5)
        );
        assert_eq!(
            evaluate_binary(OpKind::Div, &Value::Int(1), &Value::Int(0)),
            Err(EvalErrorKind::DivisionByZero)
        );
    }

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(
            bin(OpKind::FloorDiv, Value::Int(7), Value::Int(2)),
            Value::Int(3)
        );
        assert_eq!(
            bin(OpKind::FloorDiv, Value::Int(-7), Value::Int(2)),
            Value::Int(-4)
        );
    }

    #[test]
    fn modulo_takes_the_divisor_sign() {
        assert_eq!(bin(OpKind::Mod, Value::Int(-7), Value::Int(3)), Value::Int(2));
        assert_eq!(bin(OpKind::Mod, Value::Int(7), Value::Int(-3)), Value::Int(-2));
    }

    #[test]
    fn three_way_comparison_yields_sign() {
        assert_eq!(bin(OpKind::Cmp, Value::Int(1), Value::Int(2)), Value::Int(-1));
        assert_eq!(bin(OpKind::Cmp, Value::Int(2), Value::Int(2)), Value::Int(0));
        assert_eq!(
            bin(OpKind::Cmp, Value::str("b"), Value::str("a")),
            Value::Int(1)
        );
    }

    #[test]
    fn comparisons_treat_none_as_zero() {
        assert_eq!(bin(OpKind::Lt, Value::None, Value::Int(1)), Value::Bool(true));
        assert_eq!(bin(OpKind::Ge, Value::Int(0), Value::None), Value::Bool(true));
    }

    #[test]
    fn membership_covers_collections_and_ranges() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(bin(OpKind::In, Value::Int(2), list), Value::Bool(true));
        assert_eq!(
            bin(OpKind::In, Value::str("bc"), Value::str("abcd")),
            Value::Bool(true)
        );
        assert_eq!(
            bin(OpKind::In, Value::Int(5), Value::Range(1, 5)),
            Value::Bool(false)
        );
    }

    #[test]
    fn identity_distinguishes_equal_lists() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = Value::list(vec![Value::Int(1)]);
        assert_eq!(bin(OpKind::Eq, a.clone(), b.clone()), Value::Bool(true));
        assert_eq!(bin(OpKind::Same, a, b), Value::Bool(false));
    }

    #[test]
    fn power_is_exact_on_integers() {
        assert_eq!(
            bin(OpKind::Pow, Value::Int(2), Value::Int(10)),
            Value::Int(1024)
        );
        assert_eq!(
            bin(OpKind::Pow, Value::Int(2), Value::Int(-1)),
            Value::Float(0.5)
        );
    }

    #[test]
    fn unary_negation_passes_none_through() {
        assert_eq!(
            evaluate_unary(OpKind::Sub, &Value::None).expect("negate"),
            Value::None
        );
        assert_eq!(
            evaluate_unary(OpKind::Not, &Value::Int(0)).expect("not"),
            Value::Bool(true)
        );
    }
}
