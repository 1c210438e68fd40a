//! Byte-level lookahead for the placeholder scanner.

pub(super) const LINE_COMMENT: [u8; 2] = *b"--";
pub(super) const BLOCK_OPEN: [u8; 2] = *b"/*";
pub(super) const BLOCK_CLOSE: [u8; 2] = *b"*/";
/// `::type` casts must not be read as a placeholder.
pub(super) const CAST: [u8; 2] = *b"::";

/// Whether the two bytes at `idx` are exactly `pair`.
pub(super) fn at_pair(bytes: &[u8], idx: usize, pair: [u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(&pair[..])
}

/// Tag of a `$tag$` opener starting at `start`, plus the index of its second
/// `$`. `$1` is a positional parameter, not an opener.
pub(super) fn dollar_quote_opener(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let rest = bytes.get(start + 1..)?;
    if rest.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let len = rest.iter().position(|&b| b == b'$')?;
    let tag = &rest[..len];
    if !tag.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    let tag = std::str::from_utf8(tag).ok()?;
    Some((tag.to_string(), start + 1 + len))
}

/// Whether the `$` at `idx` begins the `$tag$` closer.
pub(super) fn closes_dollar_quote(bytes: &[u8], idx: usize, tag: &str) -> bool {
    bytes
        .get(idx + 1..)
        .and_then(|rest| rest.strip_prefix(tag.as_bytes()))
        .is_some_and(|after| after.first() == Some(&b'$'))
}
