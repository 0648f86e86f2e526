//! Delimiter-safe encoding of a label path into a single string.
//!
//! Components are joined with [`DELIM_CHAR`]. Any occurrence of [`DELIM_CHAR`] or
//! [`ESCAPE_CHAR`] inside a component is prefixed with [`ESCAPE_CHAR`], so no
//! character is "stolen" from labels and [`decode_path`] restores the exact input.
//!
//! The encoded form is written into the index as drill-down terms and sorted-set
//! doc values, and read back without the original labels: it must stay
//! byte-stable.

use facetry_common::{Result, error::Error};

/// Joins the path components together.
pub const DELIM_CHAR: char = '\u{1F}';

/// Escapes any occurrence of [`DELIM_CHAR`] or itself inside a component.
pub const ESCAPE_CHAR: char = '\u{1E}';

/// Encodes a sequence of components into a single string.
///
/// An empty sequence encodes to the empty string. Note that `[""]` also encodes
/// to the empty string; labels never carry empty components.
pub fn encode_path<S: AsRef<str>>(components: &[S]) -> String {
    let capacity = components
        .iter()
        .map(|c| c.as_ref().len() + 1)
        .sum::<usize>();
    let mut encoded = String::with_capacity(capacity);
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            encoded.push(DELIM_CHAR);
        }
        for ch in component.as_ref().chars() {
            if ch == DELIM_CHAR || ch == ESCAPE_CHAR {
                encoded.push(ESCAPE_CHAR);
            }
            encoded.push(ch);
        }
    }
    encoded
}

/// Encodes a dimension followed by its category path.
pub fn encode_dim_path<S: AsRef<str>>(dim: &str, path: &[S]) -> String {
    let mut components = Vec::with_capacity(path.len() + 1);
    components.push(dim);
    components.extend(path.iter().map(AsRef::as_ref));
    encode_path(&components)
}

/// Decodes a string produced by [`encode_path`] back into its components.
///
/// The input must not end with a lone [`ESCAPE_CHAR`]; `encode_path` never
/// produces one. In release builds such a dangling escape is dropped. Use
/// [`try_decode_path`] for input that did not come from the encoder.
pub fn decode_path(encoded: &str) -> Vec<String> {
    let (parts, dangling_escape) = split_path(encoded);
    debug_assert!(!dangling_escape, "dangling escape character in encoded path");
    parts
}

/// Like [`decode_path`], but rejects a trailing lone [`ESCAPE_CHAR`] with an
/// `InvalidFormat` error.
pub fn try_decode_path(encoded: &str) -> Result<Vec<String>> {
    let (parts, dangling_escape) = split_path(encoded);
    if dangling_escape {
        return Err(Error::invalid_format(
            "path",
            "encoded path ends with a dangling escape character",
        ));
    }
    Ok(parts)
}

fn split_path(encoded: &str) -> (Vec<String>, bool) {
    let mut parts = Vec::new();
    let mut current = String::with_capacity(encoded.len());
    let mut last_escape = false;
    for ch in encoded.chars() {
        if last_escape {
            current.push(ch);
            last_escape = false;
        } else if ch == ESCAPE_CHAR {
            last_escape = true;
        } else if ch == DELIM_CHAR {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);
    (parts, last_escape)
}
