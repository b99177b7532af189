//! String-interpolation scanning and escape decoding.
//!
//! An unescaped `\{` inside a string opens an interpolation region that
//! ends at the matching `}`. The interpolated expression may itself
//! contain `{ }` blocks (object literals, nested blocks) and further
//! string literals with their own interpolations, so matching the
//! closing brace needs a pushdown counter plus nested-string skipping,
//! not a regex.

/// One piece of a string literal's content.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StrPart {
    /// Literal text, escapes still intact.
    Text(String),
    /// The source text of one `\{ … }` region, braces stripped.
    Interp(String),
}

/// Find the matching `}` for an interpolation region.
///
/// `i` must point just past the opening `\{`. Returns the index of the
/// closing `}`, or `None` if the region never closes.
pub(crate) fn scan_interp_region(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut depth = 1usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'\\' => i += 1,
            q @ (b'\'' | b'"' | b'`') => {
                i = scan_string_end(bytes, i + 1, q)?;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the closing quote of a string starting just past its opening
/// quote, honoring escapes and skipping nested interpolation regions.
pub(crate) fn scan_string_end(bytes: &[u8], mut i: usize, quote: u8) -> Option<usize> {
    while i < bytes.len() {
        let b = bytes[i];
        if b == quote {
            return Some(i);
        }
        if b == b'\\' {
            if bytes.get(i + 1) == Some(&b'{') {
                i = scan_interp_region(bytes, i + 2)?;
            } else {
                i += 1;
            }
        }
        i += 1;
    }
    None
}

/// Split a string literal's raw content into literal text and
/// interpolation regions.
pub fn split_format(text: &str) -> Vec<StrPart> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes.get(i + 1) == Some(&b'{') {
                if let Some(end) = scan_interp_region(bytes, i + 2) {
                    if start < i {
                        parts.push(StrPart::Text(text[start..i].to_owned()));
                    }
                    parts.push(StrPart::Interp(text[i + 2..end].to_owned()));
                    i = end + 1;
                    start = i;
                    continue;
                }
                // Unclosed region: treat the rest as literal text.
            }
            i += 2;
            continue;
        }
        i += 1;
    }
    if start < bytes.len() {
        parts.push(StrPart::Text(text[start..].to_owned()));
    }
    parts
}

/// Decode the common escapes (`\n`, `\t`, `\r`, `\\`); any other
/// escaped character is kept verbatim without its backslash.
pub fn decode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
