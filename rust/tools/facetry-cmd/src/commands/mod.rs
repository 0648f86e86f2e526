//! Command implementations for facetry-cmd

pub mod build;
pub mod ordinals;
pub mod path;
