//! Expressions, operators, and the permissive data model.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::{error, eval, output, tuple};
use crate::environment::{Mutability, Scope};
use crate::{EvalErrorKind, Interpreter, PrintHandler, Value};

#[test]
fn arithmetic_follows_precedence() {
    assert_eq!(
        eval("1 + 2 * 3, 7 / 2, 7 // 2, 7 % 3, 2 ** 10"),
        tuple(vec![
            Value::Int(7),
            Value::Float(3.5),
            Value::Int(3),
            Value::Int(1),
            Value::Int(1024),
        ])
    );
}

#[test]
fn floor_division_and_modulo_round_toward_negative_infinity() {
    assert_eq!(
        eval("-7 // 2, -7 % 2, 7 % -2"),
        tuple(vec![Value::Int(-4), Value::Int(1), Value::Int(-1)])
    );
}

#[test]
fn none_is_absorbed_by_arithmetic() {
    assert_eq!(
        eval("none + 5, none - 5, 10 - none, none + 'x'"),
        tuple(vec![
            Value::Int(5),
            Value::Int(-5),
            Value::Int(10),
            Value::str("nonex"),
        ])
    );
}

#[test]
fn none_compares_as_zero() {
    assert_eq!(
        eval("none < 1, none <= 0, none > -1"),
        tuple(vec![Value::Bool(true), Value::Bool(true), Value::Bool(true)])
    );
}

#[test]
fn equality_crosses_int_and_float_but_identity_does_not() {
    assert_eq!(
        eval("1 == 1.0, 1 === 1.0, 2 <> 5, 'b' > 'a'"),
        tuple(vec![
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(-1),
            Value::Bool(true),
        ])
    );
}

#[test]
fn logical_operators_yield_their_operands() {
    assert_eq!(
        eval("false or 'x', 'a' and 'b', not none, true ^^ true"),
        tuple(vec![
            Value::str("x"),
            Value::str("b"),
            Value::Bool(true),
            Value::Bool(false),
        ])
    );
}

#[test]
fn short_circuit_skips_the_right_operand() {
    // The undefined name on the right is never evaluated.
    assert_eq!(eval("true or ghost"), Value::Bool(true));
    assert_eq!(eval("false and ghost"), Value::Bool(false));
}

#[test]
fn membership_covers_lists_strings_objects_and_ranges() {
    assert_eq!(
        eval("var o = {a: 1}\n'a' in o, 2 in [1, 2], 'ell' in 'hello', 3 in 1..5"),
        tuple(vec![
            Value::Bool(true),
            Value::Bool(true),
            Value::Bool(true),
            Value::Bool(true),
        ])
    );
}

#[test]
fn string_interpolation_evaluates_embedded_expressions() {
    assert_eq!(
        eval("var w = 'world'\n\"hi \\{w}, \\{1 + 1}\""),
        Value::str("hi world, 2")
    );
}

#[test]
fn declarations_are_hoisted_as_none() {
    assert_eq!(output("print(x)\nvar x = 1"), "none\n");
}

#[test]
fn tuple_assignment_destructures() {
    assert_eq!(eval("var a, b\na, b = [1, 2]\na + b"), Value::Int(3));
}

#[test]
fn destructuring_is_permissive_and_collects_a_rest() {
    assert_eq!(
        eval("var a, b\na, b = [1]\nb"),
        Value::None
    );
    assert_eq!(
        eval("var first, rest\nfirst, ...rest = [1, 2, 3]\nrest"),
        Value::list(vec![Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn postfix_update_yields_the_prior_value() {
    assert_eq!(
        eval("var i = 5\nvar j = i++\nj, i"),
        tuple(vec![Value::Int(5), Value::Int(6)])
    );
}

#[test]
fn prefix_update_yields_the_new_value() {
    assert_eq!(eval("var i = 1\n++i"), Value::Int(2));
}

#[test]
fn compound_assignment_evaluates_its_target_once() {
    assert_eq!(
        eval("var xs = [1, 2]\nvar i = 0\nxs[i++] += 10\nxs[0] + i"),
        Value::Int(12)
    );
}

#[test]
fn missing_members_and_indexes_read_as_none() {
    assert_eq!(eval("none.a.b.c"), Value::None);
    assert_eq!(eval("var o = {a: 1}\no.ghost"), Value::None);
    assert_eq!(eval("[1, 2, 3][9]"), Value::None);
}

#[test]
fn negative_indexes_count_from_the_end() {
    assert_eq!(
        eval("[1, 2, 3][-1], 'abc'[1], 'abc'[-1]"),
        tuple(vec![Value::Int(3), Value::str("b"), Value::str("c")])
    );
}

#[test]
fn ranges_index_and_measure_like_collections() {
    assert_eq!(
        eval("(2..7)[1], (2..7).length"),
        tuple(vec![Value::Int(3), Value::Int(5)])
    );
}

#[test]
fn list_methods_mutate_in_place() {
    assert_eq!(
        eval(concat!(
            "var xs = [1, 2]\n",
            "xs.push(3)\n",
            "var popped = xs.pop()\n",
            "xs.push_front(0)\n",
            "xs.join('-'), popped, xs.length",
        )),
        tuple(vec![Value::str("0-1-2"), Value::Int(3), Value::Int(3)])
    );
}

#[test]
fn object_members_read_write_and_extend() {
    assert_eq!(
        eval("var o = {n: 1}\no.n = 2\no.extra = 'new'\no.n, o.extra, o.length"),
        tuple(vec![Value::Int(2), Value::str("new"), Value::Int(2)])
    );
}

#[test]
fn spread_splices_into_list_literals() {
    assert_eq!(
        eval("var xs = [2, 3]\n[1, ...xs, 4]"),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)])
    );
}

#[test]
fn conversion_builtins() {
    assert_eq!(
        eval("str(3.5), int('42'), int(9.9), char(65), type([])"),
        tuple(vec![
            Value::str("3.5"),
            Value::Int(42),
            Value::Int(9),
            Value::str("A"),
            Value::str("list"),
        ])
    );
}

#[test]
fn iter_and_next_pull_elements_one_at_a_time() {
    assert_eq!(
        eval("var it = iter([10, 20])\nnext(it), next(it), next(it)"),
        tuple(vec![Value::Int(10), Value::Int(20), Value::None])
    );
}

#[test]
fn import_resolves_builtin_bindings() {
    assert_eq!(output("var p = import 'print'\np('hi')"), "hi\n");
    assert!(matches!(
        error("import 'no_such_module'").kind,
        EvalErrorKind::UnknownImport(_)
    ));
}

#[test]
fn print_joins_arguments_with_spaces() {
    assert_eq!(output("print(1, 'a', none)"), "1 a none\n");
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(error("1 / 0").kind, EvalErrorKind::DivisionByZero);
}

#[test]
fn caller_supplied_globals_seed_the_outermost_scope() {
    let program = crema_parse::parse("answer + 1").expect("parse");
    let mut globals = Scope::new();
    globals.define("answer", Value::Int(41), Mutability::Immutable);
    let print = Rc::new(PrintHandler::buffer());
    let result = Interpreter::with_globals(&program.ast, globals, print).run(program.root);
    assert_eq!(result.expect("evaluate"), Value::Int(42));
}

#[test]
fn supplied_globals_replace_the_default_set() {
    // Without the defaults, even `print` is just an unbound name.
    let program = crema_parse::parse("print").expect("parse");
    let print = Rc::new(PrintHandler::buffer());
    let err = Interpreter::with_globals(&program.ast, Scope::new(), print)
        .run(program.root)
        .expect_err("expected an evaluation error");
    assert_eq!(err.kind, EvalErrorKind::UndefinedVariable("print".into()));
}
