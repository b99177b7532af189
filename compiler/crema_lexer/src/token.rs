//! Token types.

use std::fmt;

use crema_ir::Origin;

/// Keywords. Contextual words that double as binary operators (`in`,
/// `is`, `has`) are keywords too; the parser maps them to operator
/// nodes by position.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Kw {
    If,
    Then,
    Else,
    Loop,
    While,
    Do,
    For,
    Switch,
    Case,
    Try,
    Return,
    Fail,
    Break,
    Continue,
    Redo,
    Proto,
    Function,
    Var,
    Const,
    Import,
    In,
    Is,
    Has,
    Public,
    Private,
    Static,
    New,
}

impl Kw {
    pub fn as_str(self) -> &'static str {
        match self {
            Kw::If => "if",
            Kw::Then => "then",
            Kw::Else => "else",
            Kw::Loop => "loop",
            Kw::While => "while",
            Kw::Do => "do",
            Kw::For => "for",
            Kw::Switch => "switch",
            Kw::Case => "case",
            Kw::Try => "try",
            Kw::Return => "return",
            Kw::Fail => "fail",
            Kw::Break => "break",
            Kw::Continue => "continue",
            Kw::Redo => "redo",
            Kw::Proto => "proto",
            Kw::Function => "function",
            Kw::Var => "var",
            Kw::Const => "const",
            Kw::Import => "import",
            Kw::In => "in",
            Kw::Is => "is",
            Kw::Has => "has",
            Kw::Public => "public",
            Kw::Private => "private",
            Kw::Static => "static",
            Kw::New => "new",
        }
    }
}

/// Token kind with decoded payload.
///
/// Numeric literals are decoded here (radix applied, digit-group
/// separators dropped). String escapes are *not* decoded here; the
/// parser decodes them when it builds `Literal`/`Format` nodes.
#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    /// String literal content between the delimiters, escapes intact.
    /// `raw` is set for backtick strings: no escapes, no interpolation.
    Str { text: String, raw: bool },
    Ident(String),
    Kw(Kw),
    /// Structural punctuation: `( ) [ ] { } , ; : =>`.
    Punct(&'static str),
    /// Operators, including the access operators `.` `->` `::` and the
    /// spread `...`. Operator tokens are eligible for reinterpretation
    /// as relaxed identifiers in member-name position.
    Op(&'static str),
    /// Comparison operators.
    Cmp(&'static str),
    /// `=`, or a fused compound assignment carrying its operator
    /// (`+=` lexes as one token with `op = Some("+")`).
    Assign(Option<&'static str>),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "num:{n}"),
            TokenKind::Float(x) => write!(f, "num:{x}"),
            TokenKind::Str { text, .. } => write!(f, "str:{text}"),
            TokenKind::Ident(name) => write!(f, "id:{name}"),
            TokenKind::Kw(kw) => write!(f, "kw:{}", kw.as_str()),
            TokenKind::Punct(p) => write!(f, "punc:{p}"),
            TokenKind::Op(op) => write!(f, "op:{op}"),
            TokenKind::Cmp(op) => write!(f, "cmp:{op}"),
            TokenKind::Assign(None) => write!(f, "assign:="),
            TokenKind::Assign(Some(op)) => write!(f, "assign:{op}="),
        }
    }
}

/// A lexed token with its source origin.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub origin: Origin,
}

impl Token {
    /// The token's text as a member name, for relaxed-identifier
    /// positions. Strings are handled separately by the parser (they
    /// may be interpolated).
    pub fn relaxed_name(&self) -> Option<String> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name.clone()),
            TokenKind::Kw(kw) => Some(kw.as_str().to_owned()),
            TokenKind::Op(op) | TokenKind::Cmp(op) => Some((*op).to_owned()),
            TokenKind::Assign(None) => Some("=".to_owned()),
            TokenKind::Assign(Some(op)) => Some(format!("{op}=")),
            _ => None,
        }
    }
}
