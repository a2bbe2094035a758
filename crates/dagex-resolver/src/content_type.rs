//! Content-type detection for files and raw blocks.
//!
//! The filename extension wins when it maps to a known type; otherwise the
//! first [`SNIFF_LEN`] bytes are inspected. Readers are always repositioned
//! at the start after sniffing.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{ResolveError, ResolveResult};

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 3072;

pub const OCTET_STREAM: &str = "application/octet-stream";

const HTML_SIGNATURES: &[&str] = &[
    "<!doctype html",
    "<html",
    "<head",
    "<script",
    "<iframe",
    "<h1",
    "<div",
    "<font",
    "<table",
    "<a",
    "<style",
    "<title",
    "<b",
    "<body",
    "<br",
    "<p",
    "<!--",
];

/// Type implied by the filename's extension, if any.
pub fn by_extension(filename: &str) -> Option<String> {
    let ext = std::path::Path::new(filename).extension()?;
    if ext.is_empty() {
        return None;
    }
    mime_guess::from_ext(&ext.to_string_lossy())
        .first_raw()
        .map(str::to_string)
}

/// Type of `head`, the leading bytes of some content.
pub fn sniff(head: &[u8]) -> String {
    if is_html(head) {
        return "text/html; charset=utf-8".to_string();
    }
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    if is_text(head) {
        return "text/plain; charset=utf-8".to_string();
    }
    OCTET_STREAM.to_string()
}

/// Collapse `text/html; charset=...` to `text/html`.
pub fn normalize(ctype: String) -> String {
    if ctype.starts_with("text/html;") {
        "text/html".to_string()
    } else {
        ctype
    }
}

/// Extension lookup, then sniffing of already read bytes.
pub fn from_prefix(filename: Option<&str>, head: &[u8]) -> String {
    let ctype = filename
        .and_then(by_extension)
        .unwrap_or_else(|| sniff(&head[..head.len().min(SNIFF_LEN)]));
    normalize(ctype)
}

/// Extension lookup, then sniffing of `reader`'s first bytes.
///
/// After sniffing the reader is seeked back to the start; failure to do so
/// is an error because the caller is about to serve the stream.
pub fn detect<R: Read + Seek>(reader: &mut R, filename: Option<&str>) -> ResolveResult<String> {
    if let Some(ctype) = filename.and_then(by_extension) {
        return Ok(normalize(ctype));
    }

    let mut head = Vec::with_capacity(SNIFF_LEN);
    reader
        .by_ref()
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(ResolveError::Sniff)?;
    reader.seek(SeekFrom::Start(0)).map_err(ResolveError::Seek)?;
    Ok(normalize(sniff(&head)))
}

fn is_html(head: &[u8]) -> bool {
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    HTML_SIGNATURES.iter().any(|sig| {
        let sig = sig.as_bytes();
        // The tag must be followed by a space or '>'.
        head.len() > sig.len()
            && head[..sig.len()].eq_ignore_ascii_case(sig)
            && matches!(head[sig.len()], b' ' | b'>')
    })
}

fn is_text(head: &[u8]) -> bool {
    // A multi-byte character may be cut at the end of the sniffed window.
    let valid = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    valid
        && !head
            .iter()
            .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c | 0x1b))
}
