//! Runtime values.
//!
//! Scalars are inline; lists, objects, and instances are shared
//! handles with interior mutability, so aliased values observe each
//! other's mutations the way the language requires.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::environment::{LocalScope, Scope};
use crate::flow::Exec;
use crate::interpreter::Interpreter;
use crate::sequence::LoopSequence;
use crema_ir::ExprId;

/// A native function. Receives the interpreter (for output and
/// sequence pulls), the receiver when called as a method, and the
/// evaluated arguments.
pub type BuiltinFn = fn(&mut Interpreter<'_>, Option<Value>, Vec<Value>) -> Exec<Value>;

/// A named native function value.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub call: BuiltinFn,
}

/// A user function: parameter nodes, body node, and the scope list
/// captured where the function literal was evaluated.
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<ExprId>,
    pub body: ExprId,
    pub captured: Vec<LocalScope<Scope>>,
}

/// A member access bound to its receiver, from `obj->member`.
pub struct BoundMethod {
    pub receiver: Value,
    pub target: Value,
}

/// A prototype: named member partitions plus an optional parent.
///
/// Statics are shared-mutable; the public and private partitions are
/// templates copied into each instance at construction.
pub struct ProtoValue {
    pub name: Option<String>,
    pub parent: Option<Rc<ProtoValue>>,
    pub public: FxHashMap<String, Value>,
    pub private: FxHashMap<String, Value>,
    pub statics: LocalScope<FxHashMap<String, Value>>,
}

impl ProtoValue {
    /// Look `name` up in the public partition, walking parents.
    pub fn public_member(&self, name: &str) -> Option<Value> {
        match self.public.get(name) {
            Some(v) => Some(v.clone()),
            None => self.parent.as_ref().and_then(|p| p.public_member(name)),
        }
    }

    /// Look `name` up in the static partition, walking parents.
    pub fn static_member(&self, name: &str) -> Option<Value> {
        match self.statics.borrow().get(name) {
            Some(v) => Some(v.clone()),
            None => self.parent.as_ref().and_then(|p| p.static_member(name)),
        }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.public.contains_key(name)
            || self.statics.borrow().contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.has_member(name))
    }
}

/// A constructed prototype instance: its proto link and a mutable,
/// extensible field map.
pub struct Instance {
    pub proto: Rc<ProtoValue>,
    pub fields: FxHashMap<String, Value>,
}

impl Instance {
    /// Whether this instance's proto chain includes `proto`.
    pub fn derives_from(&self, proto: &Rc<ProtoValue>) -> bool {
        let mut current = Some(&self.proto);
        while let Some(p) = current {
            if Rc::ptr_eq(p, proto) {
                return true;
            }
            current = p.parent.as_ref();
        }
        false
    }
}

/// An object literal's storage: insertion-ordered key/value pairs.
/// Keys compare by value equality, so numeric and string keys mix.
#[derive(Default)]
pub struct ObjectValue {
    pub entries: Vec<(Value, Value)>,
}

impl ObjectValue {
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn set(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
}

/// Every value a Crema expression can produce.
#[derive(Clone, Default)]
pub enum Value {
    /// The absent-value sentinel, `none`.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Half-open integer range from `..`.
    Range(i64, i64),
    Tuple(Rc<[Value]>),
    List(LocalScope<Vec<Value>>),
    Object(LocalScope<ObjectValue>),
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
    Bound(Rc<BoundMethod>),
    Proto(Rc<ProtoValue>),
    Instance(LocalScope<Instance>),
    /// A lazy loop in value position; pulled one element at a time.
    Sequence(LocalScope<LoopSequence>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(LocalScope::new(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Range(..) => "range",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Builtin(_) | Value::Bound(_) => "function",
            Value::Proto(_) => "proto",
            Value::Instance(_) => "instance",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Range(a, b) => a < b,
            Value::Tuple(items) => !items.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Object(obj) => !obj.borrow().entries.is_empty(),
            _ => true,
        }
    }

    /// Identity comparison for `===` and `is`: scalars compare by
    /// value and variant, shared values by handle.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Range(a, b), Value::Range(c, d)) => a == c && b == d,
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Bound(a), Value::Bound(b)) => Rc::ptr_eq(a, b),
            (Value::Proto(a), Value::Proto(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Sequence(a), Value::Sequence(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Quoted form for nesting inside list and object text.
    fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }
}

/// Structural equality for `==`: ints and floats cross-compare,
/// lists and objects compare element-wise, everything else falls back
/// to identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::List(a), Value::List(b)) => {
                a.ptr_eq(b) || *a.borrow() == *b.borrow()
            }
            (Value::Tuple(a), Value::Tuple(b)) => a[..] == b[..],
            (Value::Object(a), Value::Object(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.entries.len() == b.entries.len()
                    && a.entries
                        .iter()
                        .all(|(k, v)| b.get(k).as_ref() == Some(v))
            }
            _ => self.same(other),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else {
        write!(f, "{x:?}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => f.write_str(s),
            Value::Range(a, b) => write!(f, "{a}..{b}"),
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str(")")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => {
                f.write_str("{")?;
                for (i, (k, v)) in obj.borrow().entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k.repr(), v.repr())?;
                }
                f.write_str("}")
            }
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "<function {name}>"),
                None => f.write_str("<function>"),
            },
            Value::Builtin(b) => write!(f, "<function {}>", b.name),
            Value::Bound(b) => write!(f, "{}", b.target),
            Value::Proto(p) => match &p.name {
                Some(name) => write!(f, "<proto {name}>"),
                None => f.write_str("<proto>"),
            },
            Value::Instance(inst) => match &inst.borrow().proto.name {
                Some(name) => write!(f, "<{name} instance>"),
                None => f.write_str("<instance>"),
            },
            Value::Sequence(_) => f.write_str("<sequence>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
    }

    #[test]
    fn lists_compare_element_wise() {
        let a = Value::list(vec![Value::Int(1), Value::str("x")]);
        let b = Value::list(vec![Value::Int(1), Value::str("x")]);
        assert_eq!(a, b);
        assert!(!a.same(&b));
    }

    #[test]
    fn none_is_falsy_and_absorbs_nothing_else() {
        assert!(!Value::None.truthy());
        assert!(Value::Int(-1).truthy());
        assert!(!Value::str("").truthy());
        assert!(!Value::Range(3, 3).truthy());
    }

    #[test]
    fn display_matches_surface_syntax() {
        assert_eq!(Value::None.to_string(), "none");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(f64::NAN).to_string(), "nan");
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::str("a")]).to_string(),
            "[1, 'a']"
        );
    }
}
