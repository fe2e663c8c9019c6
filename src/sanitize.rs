//! Removal of the `<meta name="fragment" content="!">` marker.
//!
//! Pages opt into crawler snapshots with that tag; it must not survive into
//! the stored snapshot, or a crawler reading it would ask for a snapshot of
//! the snapshot.

use std::borrow::Cow;

const MARKER_NAME: &str = "fragment";

/// Remove the first `<meta name="fragment">` element from `html`.
///
/// Matching is case-insensitive on the tag and attribute names and accepts
/// double-quoted, single-quoted, and bare attribute values. Everything else
/// is left byte-for-byte intact.
pub fn strip_fragment_marker(html: &str) -> Cow<'_, str> {
    match find_marker(html) {
        Some((start, end)) => {
            let mut out = String::with_capacity(html.len() - (end - start));
            out.push_str(&html[..start]);
            out.push_str(&html[end..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(html),
    }
}

/// Byte range of the first marker element, end exclusive.
fn find_marker(html: &str) -> Option<(usize, usize)> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(offset) = lower[from..].find("<meta") {
        let start = from + offset;
        let after_name = start + "<meta".len();
        let end = match lower[after_name..].find('>') {
            Some(close) => after_name + close + 1,
            None => return None,
        };
        let boundary = lower[after_name..].chars().next();
        if matches!(boundary, Some(c) if c.is_ascii_whitespace() || c == '/' || c == '>')
            && attribute_value(&lower[after_name..end - 1], "name") == Some(MARKER_NAME)
        {
            return Some((start, end));
        }
        from = end;
    }
    None
}

/// Value of attribute `name` inside the (lowercased) attribute list of a tag.
fn attribute_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let bytes = attrs.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'/')
        {
            i += 1;
        }
        let attr_name = &attrs[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = "";
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let value_start = i + 1;
                let value_end = attrs[value_start..]
                    .bytes()
                    .position(|b| b == quote)
                    .map_or(attrs.len(), |p| value_start + p);
                value = &attrs[value_start..value_end];
                i = (value_end + 1).min(bytes.len());
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'/' {
                    i += 1;
                }
                value = &attrs[value_start..i];
            }
        }
        if attr_name == name {
            return Some(value);
        }
        if attr_name.is_empty() && i == name_start {
            // Stray character; skip it so the scan always advances.
            i += 1;
        }
    }
    None
}
