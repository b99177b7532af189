//! Tokenizer for Crema, built on logos.
//!
//! Comments and whitespace are consumed here; string literals are
//! captured whole (interpolation regions included) with escapes intact,
//! and numeric literals are decoded with their radix applied. Compound
//! assignments fuse at this stage: `+=` is one token carrying `+`.

mod error;
mod interp;
mod token;

pub use error::{LexError, LexErrorKind};
pub use interp::{decode_escapes, split_format, StrPart};
pub use token::{Kw, Token, TokenKind};

use logos::{FilterResult, Logos};

use crema_diagnostic::LineIndex;

/// Raw token from logos, before keyword classification.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    // `#` opens a comment: `#* … *#` spans lines, `# …` runs to EOL.
    #[token("#", lex_comment)]
    Comment,

    #[token("'''", |lex| lex_triple(lex, b'\''))]
    #[token("\"\"\"", |lex| lex_triple(lex, b'"'))]
    TripleStr(String),

    #[token("'", |lex| lex_quoted(lex, b'\''))]
    #[token("\"", |lex| lex_quoted(lex, b'"'))]
    Str(String),

    #[token("`", lex_raw)]
    RawStr(String),

    #[regex(r"0[bB][01][01_]*", |lex| int_radix(&lex.slice()[2..], 2))]
    #[regex(r"0[oO][0-7][0-7_]*", |lex| int_radix(&lex.slice()[2..], 8))]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*", |lex| int_radix(&lex.slice()[2..], 16))]
    #[regex(r"[0-9][0-9_]*", |lex| int_radix(lex.slice(), 10))]
    Int(i64),

    // A digit is required after the dot so `1..5` stays two integers
    // around a range operator.
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", float_lit)]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", float_lit)]
    Float(f64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("=>")]
    FatArrow,

    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("::")]
    ColonColon,
    #[token("..")]
    DotDot,
    #[token("...")]
    Ellipsis,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // Fusable operators carry whether a trailing `=` was consumed.
    #[token("+", fused)]
    Plus(bool),
    #[token("-", fused)]
    Minus(bool),
    #[token("*", fused)]
    Star(bool),
    #[token("**", fused)]
    StarStar(bool),
    #[token("/", fused)]
    Slash(bool),
    #[token("//", fused)]
    SlashSlash(bool),
    #[token("%", fused)]
    Percent(bool),
    #[token("&", fused)]
    Amp(bool),
    #[token("|", fused)]
    Pipe(bool),
    #[token("^", fused)]
    Caret(bool),
    #[token("<<", fused)]
    Shl(bool),
    #[token(">>", fused)]
    Shr(bool),
    #[token("&&", fused)]
    AmpAmp(bool),
    #[token("||", fused)]
    PipePipe(bool),
    #[token("^^", fused)]
    CaretCaret(bool),

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("<>")]
    Spaceship,

    #[token("=")]
    Eq,
}

/// Consume a comment. The `#` itself is already matched; the remainder
/// decides between a block comment and a line comment.
fn lex_comment(lex: &mut logos::Lexer<RawToken>) -> FilterResult<(), LexErrorKind> {
    let rem = lex.remainder();
    if let Some(body) = rem.strip_prefix('*') {
        match body.find("*#") {
            Some(i) => {
                lex.bump(1 + i + 2);
                FilterResult::Skip
            }
            None => FilterResult::Error(LexErrorKind::UnterminatedComment),
        }
    } else {
        match rem.find('\n') {
            Some(i) => lex.bump(i),
            None => lex.bump(rem.len()),
        }
        FilterResult::Skip
    }
}

/// Consume a single-delimiter string. Escapes are kept raw; `\{ … }`
/// interpolation regions are skipped with a brace-depth counter so a
/// `}` or quote inside the region does not close the literal. A bare
/// newline ends the line before the string did.
fn lex_quoted(lex: &mut logos::Lexer<RawToken>, quote: u8) -> Result<String, LexErrorKind> {
    let rem = lex.remainder();
    let bytes = rem.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b if b == quote => {
                let text = rem[..i].to_owned();
                lex.bump(i + 1);
                return Ok(text);
            }
            b'\n' => return Err(LexErrorKind::UnterminatedString),
            b'\\' => {
                if bytes.get(i + 1) == Some(&b'{') {
                    match interp::scan_interp_region(bytes, i + 2) {
                        Some(end) => i = end + 1,
                        None => return Err(LexErrorKind::UnterminatedString),
                    }
                } else {
                    i += 2;
                }
            }
            _ => i += 1,
        }
    }
    Err(LexErrorKind::UnterminatedString)
}

/// Consume a triple-delimiter string. Newlines are allowed; escapes and
/// interpolation regions behave as in [`lex_quoted`].
fn lex_triple(lex: &mut logos::Lexer<RawToken>, quote: u8) -> Result<String, LexErrorKind> {
    let rem = lex.remainder();
    let bytes = rem.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b if b == quote && bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) => {
                let text = rem[..i].to_owned();
                lex.bump(i + 3);
                return Ok(text);
            }
            b'\\' => {
                if bytes.get(i + 1) == Some(&b'{') {
                    match interp::scan_interp_region(bytes, i + 2) {
                        Some(end) => i = end + 1,
                        None => return Err(LexErrorKind::UnterminatedString),
                    }
                } else {
                    i += 2;
                }
            }
            _ => i += 1,
        }
    }
    Err(LexErrorKind::UnterminatedString)
}

/// Consume a backtick string: no escapes, no interpolation.
fn lex_raw(lex: &mut logos::Lexer<RawToken>) -> Result<String, LexErrorKind> {
    let rem = lex.remainder();
    match rem.find('`') {
        Some(i) => {
            let text = rem[..i].to_owned();
            lex.bump(i + 1);
            Ok(text)
        }
        None => Err(LexErrorKind::UnterminatedString),
    }
}

/// Fuse a trailing `=` into the operator token (`+=`, `<<=`, `&&=`).
/// `==` after the operator is a comparison, not a fuse.
fn fused(lex: &mut logos::Lexer<RawToken>) -> bool {
    let rem = lex.remainder().as_bytes();
    if rem.first() == Some(&b'=') && rem.get(1) != Some(&b'=') {
        lex.bump(1);
        true
    } else {
        false
    }
}

fn int_radix(digits: &str, radix: u32) -> Result<i64, LexErrorKind> {
    let mut value: i64 = 0;
    for c in digits.chars().filter(|c| *c != '_') {
        let digit = c.to_digit(radix).ok_or(LexErrorKind::InvalidNumber)?;
        value = value
            .checked_mul(i64::from(radix))
            .and_then(|v| v.checked_add(i64::from(digit)))
            .ok_or(LexErrorKind::InvalidNumber)?;
    }
    Ok(value)
}

fn float_lit(lex: &mut logos::Lexer<RawToken>) -> Result<f64, LexErrorKind> {
    let slice = lex.slice();
    let parsed = if slice.contains('_') {
        slice.replace('_', "").parse()
    } else {
        slice.parse()
    };
    parsed.map_err(|_| LexErrorKind::InvalidNumber)
}

/// Classify an identifier-shaped word: keyword, word-operator alias, or
/// plain identifier.
fn ident_kind(name: String) -> TokenKind {
    let kw = match name.as_str() {
        "if" => Kw::If,
        "then" => Kw::Then,
        "else" => Kw::Else,
        "loop" => Kw::Loop,
        "while" => Kw::While,
        "do" => Kw::Do,
        "for" => Kw::For,
        "switch" => Kw::Switch,
        "case" => Kw::Case,
        "try" => Kw::Try,
        "return" => Kw::Return,
        "fail" => Kw::Fail,
        "break" => Kw::Break,
        "continue" => Kw::Continue,
        "redo" => Kw::Redo,
        "proto" => Kw::Proto,
        "function" => Kw::Function,
        "var" => Kw::Var,
        "const" => Kw::Const,
        "import" => Kw::Import,
        "in" => Kw::In,
        "is" => Kw::Is,
        "has" => Kw::Has,
        "public" => Kw::Public,
        "private" => Kw::Private,
        "static" => Kw::Static,
        "new" => Kw::New,
        // Word aliases for the symbolic logical operators.
        "and" => return TokenKind::Op("&&"),
        "or" => return TokenKind::Op("||"),
        "not" => return TokenKind::Op("!"),
        "xor" => return TokenKind::Op("^^"),
        _ => return TokenKind::Ident(name),
    };
    TokenKind::Kw(kw)
}

fn fusable(op: &'static str, fuse: bool) -> TokenKind {
    if fuse {
        TokenKind::Assign(Some(op))
    } else {
        TokenKind::Op(op)
    }
}

fn convert(raw: RawToken) -> TokenKind {
    match raw {
        RawToken::TripleStr(text) | RawToken::Str(text) => TokenKind::Str { text, raw: false },
        RawToken::RawStr(text) => TokenKind::Str { text, raw: true },
        RawToken::Int(n) => TokenKind::Int(n),
        RawToken::Float(x) => TokenKind::Float(x),
        RawToken::Ident(name) => ident_kind(name),

        RawToken::LParen => TokenKind::Punct("("),
        RawToken::RParen => TokenKind::Punct(")"),
        RawToken::LBracket => TokenKind::Punct("["),
        RawToken::RBracket => TokenKind::Punct("]"),
        RawToken::LBrace => TokenKind::Punct("{"),
        RawToken::RBrace => TokenKind::Punct("}"),
        RawToken::Comma => TokenKind::Punct(","),
        RawToken::Semicolon => TokenKind::Punct(";"),
        RawToken::Colon => TokenKind::Punct(":"),
        RawToken::FatArrow => TokenKind::Punct("=>"),

        RawToken::Dot => TokenKind::Op("."),
        RawToken::Arrow => TokenKind::Op("->"),
        RawToken::ColonColon => TokenKind::Op("::"),
        RawToken::DotDot => TokenKind::Op(".."),
        RawToken::Ellipsis => TokenKind::Op("..."),
        RawToken::Bang => TokenKind::Op("!"),
        RawToken::Tilde => TokenKind::Op("~"),
        RawToken::PlusPlus => TokenKind::Op("++"),
        RawToken::MinusMinus => TokenKind::Op("--"),

        RawToken::Plus(f) => fusable("+", f),
        RawToken::Minus(f) => fusable("-", f),
        RawToken::Star(f) => fusable("*", f),
        RawToken::StarStar(f) => fusable("**", f),
        RawToken::Slash(f) => fusable("/", f),
        RawToken::SlashSlash(f) => fusable("//", f),
        RawToken::Percent(f) => fusable("%", f),
        RawToken::Amp(f) => fusable("&", f),
        RawToken::Pipe(f) => fusable("|", f),
        RawToken::Caret(f) => fusable("^", f),
        RawToken::Shl(f) => fusable("<<", f),
        RawToken::Shr(f) => fusable(">>", f),
        RawToken::AmpAmp(f) => fusable("&&", f),
        RawToken::PipePipe(f) => fusable("||", f),
        RawToken::CaretCaret(f) => fusable("^^", f),

        RawToken::EqEq => TokenKind::Cmp("=="),
        RawToken::NotEq => TokenKind::Cmp("!="),
        RawToken::EqEqEq => TokenKind::Cmp("==="),
        RawToken::NotEqEq => TokenKind::Cmp("!=="),
        RawToken::Lt => TokenKind::Cmp("<"),
        RawToken::Le => TokenKind::Cmp("<="),
        RawToken::Gt => TokenKind::Cmp(">"),
        RawToken::Ge => TokenKind::Cmp(">="),
        RawToken::Spaceship => TokenKind::Cmp("<>"),

        RawToken::Eq => TokenKind::Assign(None),

        // Comments are skipped inside the callback.
        RawToken::Comment => unreachable!("comments never reach conversion"),
    }
}

/// Tokenize a whole source unit.
///
/// Errors are fatal; tokenization of the unit stops at the first one.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);
    while let Some(item) = lexer.next() {
        let origin = index.origin(lexer.span().start as u32);
        match item {
            Ok(raw) => tokens.push(Token {
                kind: convert(raw),
                origin,
            }),
            Err(kind) => return Err(LexError { kind, origin }),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn numbers_decode_with_radix() {
        assert_eq!(
            kinds("0b1010 0o17 0xfF 1_000 2.5 .5"),
            vec![
                TokenKind::Int(10),
                TokenKind::Int(15),
                TokenKind::Int(255),
                TokenKind::Int(1000),
                TokenKind::Float(2.5),
                TokenKind::Float(0.5),
            ]
        );
    }

    #[test]
    fn range_is_not_a_float() {
        assert_eq!(
            kinds("1..5"),
            vec![TokenKind::Int(1), TokenKind::Op(".."), TokenKind::Int(5)]
        );
    }

    #[test]
    fn keywords_and_aliases() {
        assert_eq!(
            kinds("if and or not xor iffy"),
            vec![
                TokenKind::Kw(Kw::If),
                TokenKind::Op("&&"),
                TokenKind::Op("||"),
                TokenKind::Op("!"),
                TokenKind::Op("^^"),
                TokenKind::Ident("iffy".into()),
            ]
        );
    }

    #[test]
    fn fused_assignment_is_one_token() {
        assert_eq!(
            kinds("x += 1"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign(Some("+")),
                TokenKind::Int(1),
            ]
        );
    }

    #[test]
    fn shift_assign_fuses_but_comparison_does_not() {
        assert_eq!(
            kinds("a <<= b <= c"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Assign(Some("<<")),
                TokenKind::Ident("b".into()),
                TokenKind::Cmp("<="),
                TokenKind::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn plus_before_equality_stays_binary() {
        assert_eq!(
            kinds("a +== b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Op("+"),
                TokenKind::Cmp("=="),
                TokenKind::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn string_keeps_escapes_and_interpolation_raw() {
        assert_eq!(
            kinds(r#""a\n\{x + {y: 1}} z""#),
            vec![TokenKind::Str {
                text: r"a\n\{x + {y: 1}} z".into(),
                raw: false,
            }]
        );
    }

    #[test]
    fn interpolation_region_may_contain_closing_quote() {
        assert_eq!(
            kinds(r#""\{f("}")}" 1"#),
            vec![
                TokenKind::Str {
                    text: r#"\{f("}")}"#.into(),
                    raw: false,
                },
                TokenKind::Int(1),
            ]
        );
    }

    #[test]
    fn triple_string_spans_lines() {
        assert_eq!(
            kinds("'''a\nb''' 1"),
            vec![
                TokenKind::Str {
                    text: "a\nb".into(),
                    raw: false,
                },
                TokenKind::Int(1),
            ]
        );
    }

    #[test]
    fn backtick_string_is_raw() {
        assert_eq!(
            kinds(r"`a\n\{x}`"),
            vec![TokenKind::Str {
                text: r"a\n\{x}".into(),
                raw: true,
            }]
        );
    }

    #[test]
    fn single_quoted_string_does_not_cross_a_newline() {
        let err = tokenize("'abc\n'").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.origin.line, 1);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 # trailing\n#* block\nstill *# 2"),
            vec![TokenKind::Int(1), TokenKind::Int(2)]
        );
    }

    #[test]
    fn unterminated_block_comment_fails() {
        let err = tokenize("1 #* never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
    }

    #[test]
    fn unrecognized_token_reports_position() {
        let err = tokenize("a\n  ?").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnrecognizedToken);
        assert_eq!(err.to_string(), "Unrecognized token (2|2:4)");
    }

    #[test]
    fn origins_track_lines_and_columns() {
        let tokens = tokenize("a\n  b").expect("tokenize");
        assert_eq!(tokens[0].origin, crema_ir::Origin::new(1, 0, 0));
        assert_eq!(tokens[1].origin, crema_ir::Origin::new(2, 2, 4));
    }

    #[test]
    fn access_operators_lex_distinctly() {
        assert_eq!(
            kinds("a.b->c::d ...e"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Op("."),
                TokenKind::Ident("b".into()),
                TokenKind::Op("->"),
                TokenKind::Ident("c".into()),
                TokenKind::Op("::"),
                TokenKind::Ident("d".into()),
                TokenKind::Op("..."),
                TokenKind::Ident("e".into()),
            ]
        );
    }

    #[test]
    fn postfix_update_operators() {
        assert_eq!(
            kinds("i++ j--"),
            vec![
                TokenKind::Ident("i".into()),
                TokenKind::Op("++"),
                TokenKind::Ident("j".into()),
                TokenKind::Op("--"),
            ]
        );
    }
}
