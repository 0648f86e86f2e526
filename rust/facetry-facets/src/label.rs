//! Facet labels: the full path of a category, dimension first.

use std::fmt;

use facetry_common::{Result, error::Error};

use crate::path_codec;

/// An ordered, non-empty sequence of non-empty components where component 0 is
/// the dimension name and the remaining components are the category path within
/// that dimension.
///
/// A label of length 1 denotes the dimension itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacetLabel {
    components: Vec<String>,
}

impl FacetLabel {
    /// Creates a label from a dimension and its category path.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the dimension or any path component is empty.
    pub fn new<I, S>(dim: &str, path: I) -> Result<FacetLabel>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut components = vec![dim.to_string()];
        components.extend(path.into_iter().map(Into::into));
        Self::from_components(components)
    }

    /// Creates a label from its full component list (dimension included).
    pub fn from_components(components: Vec<String>) -> Result<FacetLabel> {
        if components.is_empty() {
            return Err(Error::validation("facet label must have at least one component"));
        }
        if components[0].is_empty() {
            return Err(Error::validation("facet dimension must not be empty"));
        }
        if let Some(pos) = components.iter().position(|c| c.is_empty()) {
            return Err(Error::validation(format!(
                "empty path component at position {pos} (dim=\"{}\")",
                components[0]
            )));
        }
        Ok(FacetLabel { components })
    }

    /// Parses a label previously produced by [`FacetLabel::encode`].
    pub fn decode(encoded: &str) -> Result<FacetLabel> {
        Self::from_components(path_codec::try_decode_path(encoded)?)
    }

    /// The dimension name (component 0).
    pub fn dim(&self) -> &str {
        &self.components[0]
    }

    /// The category path, without the dimension.
    pub fn path(&self) -> &[String] {
        &self.components[1..]
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of components, dimension included. Never zero.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the label made of the first `len` components.
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero or greater than [`FacetLabel::len`].
    pub fn subpath(&self, len: usize) -> FacetLabel {
        assert!(len > 0 && len <= self.components.len());
        FacetLabel {
            components: self.components[..len].to_vec(),
        }
    }

    /// Encodes the whole label with the delimiter-safe path codec.
    pub fn encode(&self) -> String {
        path_codec::encode_path(&self.components)
    }

    /// Encodes the first `len` components with the delimiter-safe path codec.
    pub fn encode_prefix(&self, len: usize) -> String {
        path_codec::encode_path(&self.components[..len])
    }
}

impl fmt::Display for FacetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}
