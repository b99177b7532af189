//! Operator precedence table.
//!
//! Higher binds tighter. The table covers binary operators only;
//! structural forms (call, index, tuple comma, member access, postfix
//! update) have fixed slots exposed as named constants so the grammar
//! reads against one source of truth.

/// Precedence of `=` and compound assignment.
pub(crate) const ASSIGN_PREC: u8 = 2;
/// Precedence of the tuple-building comma.
pub(crate) const TUPLE_PREC: u8 = 3;
/// Precedence of spread `...` and the range operator.
pub(crate) const SPREAD_PREC: u8 = 4;
/// Precedence of `in`/`is`/`has`, shared with the comparisons.
pub(crate) const WORD_CMP_PREC: u8 = 13;
/// Precedence of the postfix `++`/`--`.
pub(crate) const POSTFIX_PREC: u8 = 20;
/// Precedence of `.`, `->`, `::`.
pub(crate) const ACCESS_PREC: u8 = 21;

/// Binding strength of a binary operator, `None` for tokens that are
/// never infix.
pub(crate) fn binary_prec(op: &str) -> Option<u8> {
    Some(match op {
        ".." => SPREAD_PREC,
        "||" => 6,
        "^^" => 7,
        "&&" => 8,
        "|" => 9,
        "^" => 10,
        "&" => 11,
        "==" | "!=" | "===" | "!==" => 12,
        "<" | "<=" | ">" | ">=" | "<>" => WORD_CMP_PREC,
        "<<" | ">>" => 14,
        "+" | "-" => 17,
        "*" | "/" | "%" => 18,
        "**" | "//" => 19,
        _ => return None,
    })
}

/// Binding strength of a prefix operator.
pub(crate) fn unary_prec(op: &str) -> Option<u8> {
    Some(match op {
        "..." => SPREAD_PREC,
        "!" => 15,
        "~" => 16,
        "+" | "-" => 17,
        "++" | "--" => POSTFIX_PREC,
        _ => return None,
    })
}

/// Only exponentiation groups right-to-left.
pub(crate) fn is_right_assoc(op: &str) -> bool {
    op == "**"
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(binary_prec("*") > binary_prec("+"));
        assert!(binary_prec("+") > binary_prec("=="));
    }

    #[test]
    fn access_is_tightest() {
        for op in ["..", "||", "==", "<<", "+", "**"] {
            assert!(binary_prec(op).expect("infix") < ACCESS_PREC);
        }
    }

    #[test]
    fn structural_tokens_are_not_infix() {
        assert_eq!(binary_prec(","), None);
        assert_eq!(binary_prec("."), None);
        assert_eq!(binary_prec("..."), None);
        assert_eq!(binary_prec("!"), None);
    }

    #[test]
    fn exponentiation_is_right_associative() {
        assert!(is_right_assoc("**"));
        assert!(!is_right_assoc("-"));
    }
}
