//! Core definitions (errors and result helpers), relied upon by all facetry-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
