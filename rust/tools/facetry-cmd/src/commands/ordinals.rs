//! Ordinal set inspection command

use anyhow::{Context, Result};
use facetry_facets::{Ordinal, ordinals::decode_ordinal_set};

use crate::utils;

pub fn run(hex: String) -> Result<()> {
    let ordinals = decode_hex(&hex)?;
    println!("{}", serde_json::to_string(&ordinals)?);
    Ok(())
}

fn decode_hex(hex: &str) -> Result<Vec<Ordinal>> {
    let bytes = utils::from_hex(hex).context("Invalid hex input")?;
    decode_ordinal_set(&bytes).context("Invalid ordinal set")
}
