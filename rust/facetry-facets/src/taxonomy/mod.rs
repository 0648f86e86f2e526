//! The ordinal-assignment collaborator used by the document builder.
//!
//! A taxonomy maps every distinct [`FacetLabel`] to an [`Ordinal`] and records
//! each ordinal's parent. The builder only ever asks for ordinals and walks
//! parent links; it never invents ordinals itself.

pub mod memory;

use facetry_common::Result;

use crate::{label::FacetLabel, ordinals::Ordinal};

/// Write access to a taxonomy.
///
/// Implementations own their concurrency control: `add_category` must return the
/// same ordinal for the same label no matter how many callers race on it.
pub trait TaxonomyWriter: Send + Sync {
    /// Returns the ordinal of `label`, creating it (and any missing ancestors)
    /// if needed.
    ///
    /// # Errors
    ///
    /// Fails only on a fatal internal error (e.g. storage I/O); such errors are
    /// propagated unchanged by the builder.
    fn add_category(&self, label: &FacetLabel) -> Result<Ordinal>;

    /// Returns the ordinal of the immediate ancestor of `ordinal`, or a value
    /// `<= 0` for the root or an unknown ordinal.
    fn get_parent(&self, ordinal: Ordinal) -> Result<Ordinal>;
}
