//! Path encoding commands

use anyhow::{Context, Result};
use facetry_facets::path_codec;

use crate::utils;

pub fn run_encode(components: Vec<String>) -> Result<()> {
    let components: Vec<String> = components
        .iter()
        .map(|c| utils::unescape_control(c))
        .collect();
    println!("{}", utils::escape_control(&encode(&components)));
    Ok(())
}

pub fn run_decode(encoded: String) -> Result<()> {
    let components = decode(&utils::unescape_control(&encoded))?;
    let json = serde_json::to_string(&components).context("Failed to serialize components")?;
    println!("{json}");
    Ok(())
}

fn encode(components: &[String]) -> String {
    path_codec::encode_path(components)
}

fn decode(encoded: &str) -> Result<Vec<String>> {
    path_codec::try_decode_path(encoded).context("Invalid encoded path")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_round_trip() {
        // A component holding a literal delimiter, as typed on a command line.
        let typed = vec!["Author".to_string(), "Bob\\x1fJr".to_string()];
        let components: Vec<String> = typed.iter().map(|c| utils::unescape_control(c)).collect();

        let printed = utils::escape_control(&encode(&components));
        assert_eq!(printed, "Author\\x1fBob\\x1e\\x1fJr");
        assert_eq!(decode(&utils::unescape_control(&printed)).unwrap(), components);
    }

    #[test]
    fn test_decode_dangling_escape_is_an_error() {
        let err = decode(&utils::unescape_control("a\\x1e")).unwrap_err();
        assert!(err.to_string().contains("Invalid encoded path"), "{err:#}");
    }
}
