//! Tree-walking evaluator.
//!
//! Executes the annotated arena AST directly: blocks push scopes,
//! calls push frames over captured scope lists, loops become lazy
//! sequences, and non-local control (branches, `return`, `fail`)
//! travels the error channel as signals until something catches it.

pub mod builtins;
pub mod environment;
pub mod errors;
pub mod flow;
pub mod methods;
pub mod operators;
pub mod print_handler;
pub mod sequence;
pub mod value;

mod interpreter;

#[cfg(test)]
mod tests;

use std::rc::Rc;

pub use environment::Scope;
pub use errors::{EvalError, EvalErrorKind};
pub use interpreter::Interpreter;
pub use print_handler::PrintHandler;
pub use value::Value;

use crema_ir::Program;

/// Evaluate a program with output going to stdout.
pub fn evaluate(program: &Program) -> Result<Value, EvalError> {
    evaluate_with(program, Rc::new(PrintHandler::Stdout))
}

/// Evaluate a program with an explicit print destination.
pub fn evaluate_with(program: &Program, print: Rc<PrintHandler>) -> Result<Value, EvalError> {
    Interpreter::new(&program.ast, print).run(program.root)
}

/// Evaluate a program with caller-supplied globals seeding the
/// outermost scope. The default global set is only the convenience
/// used by [`evaluate`]; any bindings work here, including none.
pub fn evaluate_with_globals(program: &Program, globals: Scope) -> Result<Value, EvalError> {
    Interpreter::with_globals(&program.ast, globals, Rc::new(PrintHandler::Stdout))
        .run(program.root)
}
