//! End-to-end evaluation tests: parse real source, run it, check the
//! value and any captured output.

mod control_tests;
mod eval_tests;

use std::rc::Rc;

use crate::{EvalError, Interpreter, PrintHandler, Value};

fn run(src: &str) -> (Result<Value, EvalError>, String) {
    let program = crema_parse::parse(src).expect("parse");
    let print = Rc::new(PrintHandler::buffer());
    let result = Interpreter::new(&program.ast, Rc::clone(&print)).run(program.root);
    (result, print.output())
}

/// Evaluate and return the program's value.
fn eval(src: &str) -> Value {
    run(src).0.expect("evaluate")
}

/// Evaluate and return what the program printed.
fn output(src: &str) -> String {
    let (result, out) = run(src);
    result.expect("evaluate");
    out
}

/// Evaluate source expected to fail.
fn error(src: &str) -> EvalError {
    run(src).0.expect_err("expected an evaluation error")
}

fn tuple(items: Vec<Value>) -> Value {
    Value::Tuple(items.into())
}
