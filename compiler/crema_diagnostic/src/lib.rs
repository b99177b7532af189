//! Diagnostic rendering for Crema.
//!
//! The user-visible failure format is stable and scraped by existing
//! scripts, so it is centralized here:
//!
//! ```text
//! <message> (<line>|<column>:<byteOffset>)
//! <offending source line, tabs widened>
//! ----^
//! ```

mod line_index;

pub use line_index::LineIndex;

use crema_ir::Origin;

/// Format a message with its position suffix, without the excerpt.
///
/// Produces `"<message> (<line>|<col>:<pos>)"`.
pub fn position_suffix(message: &str, origin: Origin) -> String {
    format!("{message} ({origin})")
}

/// Render the offending source line with a caret under the column.
///
/// Tabs are widened to single spaces so the caret column stays aligned
/// with the dashes.
pub fn caret_excerpt(source: &str, origin: Origin) -> String {
    let line = source
        .lines()
        .nth(origin.line.saturating_sub(1) as usize)
        .unwrap_or("");
    let line = line.replace('\t', " ");
    let dashes = "-".repeat(origin.col as usize);
    format!("{line}\n{dashes}^")
}

/// Full diagnostic text: message, position, excerpt, caret.
pub fn render(message: &str, origin: Origin, source: &str) -> String {
    format!(
        "{}\n{}",
        position_suffix(message, origin),
        caret_excerpt(source, origin)
    )
}
