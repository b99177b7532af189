//! Variable scoping for the interpreter.
//!
//! A frame per active function call, a scope per active block inside
//! it. Scopes are shared (`LocalScope`) so closures and lazy loop
//! sequences can capture the scope list by handle and observe later
//! writes.

// Rc is the intentional implementation detail of LocalScope<T>
#![allow(clippy::disallowed_types)]

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Whether a variable binding can be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    /// Declared with `var`.
    Mutable,
    /// Declared with `const`.
    Immutable,
}

impl Mutability {
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }

    /// Mutability matching a hoisted declaration's flag.
    pub fn from_flag(mutable: bool) -> Self {
        if mutable {
            Mutability::Mutable
        } else {
            Mutability::Immutable
        }
    }
}

/// A single-threaded shared-mutable cell.
///
/// Wraps `Rc<RefCell<T>>` behind a factory so every shared scope
/// allocation goes through one place. Not thread-safe; the
/// interpreter runs single-threaded and `Rc` is the cheaper choice.
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Identity comparison: do both handles point at the same cell?
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T: Default> Default for LocalScope<T> {
    fn default() -> Self {
        LocalScope::new(T::default())
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// One name's slot in a scope.
#[derive(Clone, Debug)]
pub struct Binding {
    pub value: Value,
    pub mutability: Mutability,
}

/// Variable bindings of a single block.
#[derive(Default, Debug)]
pub struct Scope {
    bindings: FxHashMap<String, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn define(&mut self, name: &str, value: Value, mutability: Mutability) {
        self.bindings
            .insert(name.to_owned(), Binding { value, mutability });
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.bindings.get_mut(name)
    }

    /// Bound names, sorted for deterministic traces.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// One function activation: its name, the line currently executing,
/// and the stack of block scopes visible to it.
#[derive(Debug)]
pub struct Frame {
    name: Option<String>,
    line: u32,
    scopes: Vec<LocalScope<Scope>>,
}

/// The full variable environment of a running program.
///
/// The bottom frame is the program itself; its first scope holds the
/// builtin globals and is shared into every captured scope list, so
/// builtins resolve from any frame.
#[derive(Debug)]
pub struct Environment {
    builtins: LocalScope<Scope>,
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new(globals: Scope) -> Self {
        let builtins = LocalScope::new(globals);
        Environment {
            builtins: builtins.clone(),
            frames: vec![Frame {
                name: None,
                line: 0,
                scopes: vec![builtins],
            }],
        }
    }

    fn top(&self) -> &Frame {
        self.frames.last().expect("environment always has a frame")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .expect("environment always has a frame")
    }

    pub fn push_scope(&mut self) {
        self.top_mut().scopes.push(LocalScope::default());
    }

    pub fn pop_scope(&mut self) {
        self.top_mut().scopes.pop();
    }

    pub fn push_frame(&mut self, name: Option<String>, scopes: Vec<LocalScope<Scope>>) {
        let line = self.top().line;
        self.frames.push(Frame { name, line, scopes });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// The current frame's scope list, for closures and sequences.
    /// Handles are cloned; the scopes themselves stay shared.
    pub fn capture(&self) -> Vec<LocalScope<Scope>> {
        self.top().scopes.clone()
    }

    /// Innermost scope of the current frame, where fresh assignments
    /// land.
    pub fn innermost(&self) -> LocalScope<Scope> {
        self.top()
            .scopes
            .last()
            .expect("frame always has a scope")
            .clone()
    }

    /// Innermost scope of the current frame that binds `name`. Outer
    /// frames are not searched; visibility crosses frames only through
    /// captured scope lists.
    pub fn resolve(&self, name: &str) -> Option<LocalScope<Scope>> {
        self.top()
            .scopes
            .iter()
            .rev()
            .find(|scope| scope.borrow().contains(name))
            .cloned()
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.resolve(name)
            .and_then(|scope| scope.borrow().get(name).map(|b| b.value.clone()))
    }

    pub fn define(&mut self, name: &str, value: Value, mutability: Mutability) {
        self.innermost().borrow_mut().define(name, value, mutability);
    }

    /// Look a name up in the builtin globals only, for `import`.
    pub fn builtin(&self, name: &str) -> Option<Value> {
        self.builtins.borrow().get(name).map(|b| b.value.clone())
    }

    pub fn set_line(&mut self, line: u32) {
        self.top_mut().line = line;
    }

    /// One line per frame, outermost first. The builtin scope is
    /// omitted; traces describe the user's program.
    pub fn trace(&self) -> Vec<String> {
        self.frames
            .iter()
            .map(|frame| {
                let name = frame.name.as_deref().unwrap_or("global");
                let scopes = frame
                    .scopes
                    .iter()
                    .filter(|scope| !scope.ptr_eq(&self.builtins))
                    .map(|scope| format!("{{{}}}", scope.borrow().names().join(", ")))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name} (line {line}): [{scopes}]", line = frame.line)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_resolve_innermost_first() {
        let mut env = Environment::new(Scope::new());
        env.push_scope();
        env.define("x", Value::Int(1), Mutability::Mutable);
        env.push_scope();
        env.define("x", Value::Int(2), Mutability::Mutable);

        assert_eq!(env.lookup("x"), Some(Value::Int(2)));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(Value::Int(1)));
    }

    #[test]
    fn frames_do_not_see_caller_locals() {
        let mut env = Environment::new(Scope::new());
        env.push_scope();
        env.define("local", Value::Int(1), Mutability::Mutable);

        env.push_frame(Some("f".into()), Vec::new());
        env.push_scope();
        assert_eq!(env.lookup("local"), None);
        env.pop_frame();

        assert_eq!(env.lookup("local"), Some(Value::Int(1)));
    }

    #[test]
    fn captured_scopes_share_later_writes() {
        let mut env = Environment::new(Scope::new());
        env.push_scope();
        env.define("n", Value::Int(0), Mutability::Mutable);
        let captured = env.capture();

        env.push_frame(Some("f".into()), captured);
        if let Some(scope) = env.resolve("n") {
            if let Some(binding) = scope.borrow_mut().get_mut("n") {
                binding.value = Value::Int(7);
            }
        }
        env.pop_frame();

        assert_eq!(env.lookup("n"), Some(Value::Int(7)));
    }

    #[test]
    fn traces_name_frames_and_their_scopes() {
        let mut globals = Scope::new();
        globals.define("print", Value::None, Mutability::Immutable);
        let mut env = Environment::new(globals);
        env.push_scope();
        env.define("b", Value::Int(1), Mutability::Mutable);
        env.define("a", Value::Int(2), Mutability::Mutable);
        env.set_line(3);

        assert_eq!(env.trace(), vec!["global (line 3): [{a, b}]".to_owned()]);
    }
}
