//! Control flow: conditionals, lazy loops, switches, and `try`.

use pretty_assertions::assert_eq;

use super::{eval, output, tuple};
use crate::Value;

#[test]
fn if_selects_a_branch() {
    assert_eq!(eval("if 1 < 2 { 'yes' } else { 'no' }"), Value::str("yes"));
    assert_eq!(eval("if false then 'a' else 'b'"), Value::str("b"));
    assert_eq!(eval("if false { 'a' }"), Value::None);
}

#[test]
fn while_in_statement_position_runs_to_completion() {
    assert_eq!(eval("var n = 0\nwhile n < 3 { n += 1 }\nn"), Value::Int(3));
}

#[test]
fn loops_are_lazy_until_pulled() {
    // Binding a loop runs nothing; draining it runs everything.
    assert_eq!(
        eval(concat!(
            "var n = 0\n",
            "var s = while n < 3 { n += 1; n }\n",
            "var before = n\n",
            "for (x in s) { x }\n",
            "before, n",
        )),
        tuple(vec![Value::Int(0), Value::Int(3)])
    );
}

#[test]
fn sequences_are_single_pass() {
    assert_eq!(
        eval(concat!(
            "var n = 0\n",
            "var s = while n < 2 { n += 1 }\n",
            "for (x in s) { x }\n",
            "var after = n\n",
            "for (x in s) { x }\n",
            "after, n",
        )),
        tuple(vec![Value::Int(2), Value::Int(2)])
    );
}

#[test]
fn then_branch_is_the_final_element_on_exhaustion() {
    assert_eq!(
        eval(concat!(
            "var n = 0\n",
            "var last = none\n",
            "for (v in while n < 2 { n += 1; 'tick' } then 'done') { last = v }\n",
            "last",
        )),
        Value::str("done")
    );
}

#[test]
fn else_branch_is_the_final_element_on_break() {
    assert_eq!(
        eval(concat!(
            "var last = none\n",
            "for (v in while true { break } else 'stopped') { last = v }\n",
            "last",
        )),
        Value::str("stopped")
    );
}

#[test]
fn loop_always_part_runs_before_the_condition() {
    assert_eq!(
        eval("var n = 0\nloop { n += 1 } while n < 3 { 0 }\nn"),
        Value::Int(3)
    );
}

#[test]
fn for_iterates_lists_strings_and_ranges() {
    assert_eq!(
        eval(concat!(
            "var total = 0\n",
            "for (x in [1, 2, 3]) { total += x }\n",
            "for (x in 1..4) { total += x }\n",
            "for (c in 'ab') { total += c.length }\n",
            "total",
        )),
        Value::Int(14)
    );
}

#[test]
fn for_iterates_object_keys_in_insertion_order() {
    assert_eq!(
        eval(concat!(
            "var o = {a: 1, b: 2}\n",
            "var ks = []\n",
            "for (k in o) { ks.push(k) }\n",
            "ks.join('')",
        )),
        Value::str("ab")
    );
}

#[test]
fn continue_skips_to_the_next_element() {
    assert_eq!(
        eval(concat!(
            "var total = 0\n",
            "for (x in 1..6) {\n",
            "  if x % 2 == 0 { continue }\n",
            "  total += x\n",
            "}\n",
            "total",
        )),
        Value::Int(9)
    );
}

#[test]
fn break_levels_cross_enclosing_loops() {
    // `break 1` from the inner loop ends the outer one too.
    assert_eq!(
        eval(concat!(
            "var hits = 0\n",
            "for (i in 1..4) {\n",
            "  for (j in 1..4) {\n",
            "    if j == 2 { break 1 }\n",
            "    hits += 1\n",
            "  }\n",
            "}\n",
            "hits",
        )),
        Value::Int(1)
    );
}

#[test]
fn redo_repeats_the_current_element() {
    assert_eq!(
        eval(concat!(
            "var tries = 0\n",
            "for (x in 1..3) {\n",
            "  tries += 1\n",
            "  if tries == 1 and x == 1 { redo }\n",
            "}\n",
            "tries",
        )),
        Value::Int(3)
    );
}

#[test]
fn switch_falls_through_colon_cases() {
    let src = concat!(
        "function f(x) {\n",
        "  switch x {\n",
        "    case 1: print('A')\n",
        "    case 2 => print('B')\n",
        "    case 3 => print('C')\n",
        "  }\n",
        "}\n",
        "f(1)\nf(2)\nf(3)",
    );
    assert_eq!(output(src), "A\nB\nB\nC\n");
}

#[test]
fn switch_matches_by_membership_and_falls_back_to_else() {
    let src = concat!(
        "function grade(n) {\n",
        "  switch n {\n",
        "    case in 90..101 => 'A'\n",
        "    case in 80..90 => 'B'\n",
        "    else => 'F'\n",
        "  }\n",
        "}\n",
        "grade(95), grade(85), grade(10)",
    );
    assert_eq!(
        eval(src),
        tuple(vec![Value::str("A"), Value::str("B"), Value::str("F")])
    );
}

#[test]
fn switch_without_a_match_or_default_is_none() {
    assert_eq!(eval("switch 9 { case 1 => 'one' }"), Value::None);
}

#[test]
fn switch_break_takes_the_else_branch() {
    assert_eq!(
        eval("switch 1 { case 1 => break } else 'broke'"),
        Value::str("broke")
    );
}

#[test]
fn switch_continue_takes_the_then_branch() {
    assert_eq!(
        eval("switch 1 { case 1 => continue } then 'moved on'"),
        Value::str("moved on")
    );
}

#[test]
fn try_passes_successful_values_through() {
    assert_eq!(eval("try { 41 + 1 } fail e { 'handled' }"), Value::Int(42));
}

#[test]
fn try_then_branch_replaces_the_value_on_success() {
    assert_eq!(
        eval("try { 1 } fail e { 'handled' } then 'ok'"),
        Value::str("ok")
    );
}

#[test]
fn fail_binds_its_payload_in_the_handler() {
    assert_eq!(
        eval("try { fail 'boom'; 'unreached' } fail e { 'caught ' + e }"),
        Value::str("caught boom")
    );
}

#[test]
fn fail_crosses_call_boundaries() {
    assert_eq!(
        eval(concat!(
            "function risky() { fail 'bad input' }\n",
            "try { risky() } fail msg { 'caught ' + msg }",
        )),
        Value::str("caught bad input")
    );
}

#[test]
fn semantic_errors_are_catchable_as_their_message() {
    assert_eq!(
        eval("try { 1 / 0 } fail e { e }"),
        Value::str("Division by zero")
    );
}

#[test]
fn try_else_branch_replaces_the_handler_value() {
    assert_eq!(
        eval("try { fail 'x' } fail e { 'handled' } else 'recovered'"),
        Value::str("recovered")
    );
}
