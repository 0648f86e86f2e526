//! Common utilities for facetry-cmd

use anyhow::{Result, bail};
use std::path::Path;

/// Checks if a file exists and is readable
pub fn validate_file_exists(path: &str) -> Result<()> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        bail!("File does not exist: {}", path);
    }
    if !file_path.is_file() {
        bail!("Path is not a file: {}", path);
    }
    Ok(())
}

/// Formats bytes as lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parses a hex string; whitespace is ignored
pub fn from_hex(hex: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        bail!("Odd number of hex digits");
    }
    digits
        .chunks(2)
        .map(|pair| -> Result<u8> {
            let s = std::str::from_utf8(pair)?;
            Ok(u8::from_str_radix(s, 16)?)
        })
        .collect()
}

/// Replaces the `\x1f` and `\x1e` escapes typed on a command line with the
/// characters they stand for, and renders those characters back the same way.
pub fn unescape_control(s: &str) -> String {
    s.replace("\\x1f", "\u{1F}").replace("\\x1e", "\u{1E}")
}

pub fn escape_control(s: &str) -> String {
    s.replace('\u{1F}', "\\x1f").replace('\u{1E}', "\\x1e")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(to_hex(&[0x00, 0x81, 0xff]), "0081ff");
        assert_eq!(from_hex("00 81ff").unwrap(), vec![0x00, 0x81, 0xff]);
        assert!(from_hex("abc").is_err());
        assert!(from_hex("zz").is_err());
    }

    #[test]
    fn test_control_escapes() {
        let raw = "a\u{1F}b\u{1E}\u{1F}c";
        assert_eq!(escape_control(raw), "a\\x1fb\\x1e\\x1fc");
        assert_eq!(unescape_control(&escape_control(raw)), raw);
    }
}
