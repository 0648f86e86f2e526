//! Test utilities and helpers for the facetry crates.
//!
//! This crate provides synthetic data generation (label paths, ordinal sets)
//! for the facetry test suites. It depends on nothing but `fastrand` so that any
//! crate in the workspace can use it as a dev-dependency.

pub mod data_gen;
