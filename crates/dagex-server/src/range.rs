//! Single byte-range requests.

/// Outcome of matching a `Range` header against a body of known size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole body.
    Full,
    /// Serve `start..=end`.
    Partial { start: u64, end: u64 },
    /// No byte of the body is in range.
    Unsatisfiable,
}

impl ByteRange {
    /// Interpret `header` for a body of `size` bytes.
    ///
    /// Only a single `bytes=` range is honoured; anything else, including
    /// multi-range requests, falls back to the full body.
    pub fn parse(header: Option<&str>, size: u64) -> Self {
        let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return ByteRange::Full;
        };
        if spec.contains(',') {
            return ByteRange::Full;
        }
        let Some((first, last)) = spec.split_once('-') else {
            return ByteRange::Full;
        };
        let (first, last) = (first.trim(), last.trim());

        let range = if first.is_empty() {
            // Suffix: the last N bytes.
            match last.parse::<u64>() {
                Ok(0) => return ByteRange::Unsatisfiable,
                Ok(n) => Some((size.saturating_sub(n), size.saturating_sub(1))),
                Err(_) => None,
            }
        } else {
            match (first.parse::<u64>(), last) {
                (Ok(start), "") => Some((start, size.saturating_sub(1))),
                (Ok(start), last) => match last.parse::<u64>() {
                    Ok(end) if end >= start => Some((start, end.min(size.saturating_sub(1)))),
                    _ => None,
                },
                _ => None,
            }
        };

        match range {
            None => ByteRange::Full,
            Some((start, _)) if size == 0 || start >= size => ByteRange::Unsatisfiable,
            Some((start, end)) => ByteRange::Partial { start, end },
        }
    }

    /// `Content-Range` value for this range.
    pub fn content_range(&self, size: u64) -> Option<String> {
        match self {
            ByteRange::Full => None,
            ByteRange::Partial { start, end } => Some(format!("bytes {start}-{end}/{size}")),
            ByteRange::Unsatisfiable => Some(format!("bytes */{size}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header_is_full() {
        assert_eq!(ByteRange::parse(None, 10), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("items=0-1"), 10), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=0-1,4-5"), 10), ByteRange::Full);
    }

    #[test]
    fn bounded_open_and_suffix() {
        assert_eq!(
            ByteRange::parse(Some("bytes=2-5"), 10),
            ByteRange::Partial { start: 2, end: 5 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=7-"), 10),
            ByteRange::Partial { start: 7, end: 9 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=-3"), 10),
            ByteRange::Partial { start: 7, end: 9 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=5-100"), 10),
            ByteRange::Partial { start: 5, end: 9 }
        );
    }

    #[test]
    fn out_of_range() {
        assert_eq!(ByteRange::parse(Some("bytes=10-"), 10), ByteRange::Unsatisfiable);
        assert_eq!(ByteRange::parse(Some("bytes=-0"), 10), ByteRange::Unsatisfiable);
        assert_eq!(
            ByteRange::Unsatisfiable.content_range(10).as_deref(),
            Some("bytes */10")
        );
    }

    #[test]
    fn malformed_is_full() {
        assert_eq!(ByteRange::parse(Some("bytes=5-2"), 10), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=a-b"), 10), ByteRange::Full);
    }
}
