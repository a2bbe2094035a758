//! Compiling slash-delimited paths into selectors.

use crate::error::{SelectorError, SelectorResult};
use crate::selector::Selector;

/// Map keys may hold anything printable (`@type`, `a:b`); control
/// characters never name a field.
fn valid_char(c: char) -> bool {
    !c.is_control()
}

/// Compile `path` into a selector that descends field by field along the
/// path and applies `target` at its end.
///
/// Leading and trailing slashes are ignored; an empty path yields `target`
/// itself. Each segment becomes a single-field explore, which also
/// addresses list elements by index (`Links/0/Hash`). Nothing is returned
/// unless the whole path is valid.
pub fn compile_path(path: &str, target: Selector) -> SelectorResult<Selector> {
    let invalid = |reason: String| SelectorError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if let Some((offset, c)) = path.char_indices().find(|(_, c)| *c != '/' && !valid_char(*c)) {
        return Err(invalid(format!("invalid character {c:?} at offset {offset}")));
    }

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(target);
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if let Some(i) = segments.iter().position(|s| s.is_empty()) {
        return Err(invalid(format!("empty segment at position {i}")));
    }
    if let Some(s) = segments.iter().find(|s| s.trim().is_empty()) {
        return Err(invalid(format!("blank segment {s:?}")));
    }

    Ok(segments
        .iter()
        .rev()
        .fold(target, |next, segment| Selector::field(*segment, next)))
}
