//! Facet annotations attached to a source document.
//!
//! The set of annotation kinds is closed: every kind is a variant of
//! [`FacetAnnotation`], and the document builder dispatches on it exhaustively.

use facetry_common::Result;

use crate::{associations::AssociationValue, label::FacetLabel};

/// A flat or hierarchical facet: a dimension plus a category path.
///
/// The category gets a taxonomy ordinal; drill-down terms are emitted for every
/// prefix of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetField {
    label: FacetLabel,
}

impl FacetField {
    /// Creates a facet for `dim` with a non-empty category `path`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `path` is empty or any component is empty.
    pub fn new<I, S>(dim: &str, path: I) -> Result<FacetField>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let label = FacetLabel::new(dim, path)?;
        verify_has_path(&label)?;
        Ok(FacetField { label })
    }

    pub fn dim(&self) -> &str {
        self.label.dim()
    }

    pub fn path(&self) -> &[String] {
        self.label.path()
    }

    pub fn label(&self) -> &FacetLabel {
        &self.label
    }
}

/// A single opaque label under a dimension, counted by the label string itself
/// rather than by a taxonomy ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedSetFacetField {
    dim: String,
    label: String,
}

impl SortedSetFacetField {
    pub fn new(dim: impl Into<String>, label: impl Into<String>) -> Result<SortedSetFacetField> {
        let dim = dim.into();
        let label = label.into();
        // Validates both parts the same way as taxonomy labels.
        FacetLabel::from_components(vec![dim.clone(), label.clone()])?;
        Ok(SortedSetFacetField { dim, label })
    }

    pub fn dim(&self) -> &str {
        &self.dim
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A facet label carrying a scalar payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationFacetField {
    label: FacetLabel,
    value: AssociationValue,
}

impl AssociationFacetField {
    pub fn new<I, S>(dim: &str, path: I, value: AssociationValue) -> Result<AssociationFacetField>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let label = FacetLabel::new(dim, path)?;
        verify_has_path(&label)?;
        Ok(AssociationFacetField { label, value })
    }

    /// Association with an `i32` payload.
    pub fn int<I, S>(dim: &str, path: I, value: i32) -> Result<AssociationFacetField>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(dim, path, AssociationValue::Int(value))
    }

    /// Association with an `f32` payload.
    pub fn float<I, S>(dim: &str, path: I, value: f32) -> Result<AssociationFacetField>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(dim, path, AssociationValue::Float(value))
    }

    /// Association with an opaque byte payload.
    pub fn bytes<I, S>(dim: &str, path: I, value: Vec<u8>) -> Result<AssociationFacetField>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(dim, path, AssociationValue::Bytes(value))
    }

    pub fn dim(&self) -> &str {
        self.label.dim()
    }

    pub fn label(&self) -> &FacetLabel {
        &self.label
    }

    pub fn value(&self) -> &AssociationValue {
        &self.value
    }
}

fn verify_has_path(label: &FacetLabel) -> Result<()> {
    if label.len() < 2 {
        return Err(facetry_common::error::Error::validation(format!(
            "path must have at least one component (dim=\"{}\")",
            label.dim()
        )));
    }
    Ok(())
}

/// Any facet annotation a document may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetAnnotation {
    Facet(FacetField),
    SortedSet(SortedSetFacetField),
    Association(AssociationFacetField),
}

impl FacetAnnotation {
    pub fn dim(&self) -> &str {
        match self {
            FacetAnnotation::Facet(f) => f.dim(),
            FacetAnnotation::SortedSet(f) => f.dim(),
            FacetAnnotation::Association(f) => f.dim(),
        }
    }
}

impl From<FacetField> for FacetAnnotation {
    fn from(field: FacetField) -> Self {
        FacetAnnotation::Facet(field)
    }
}

impl From<SortedSetFacetField> for FacetAnnotation {
    fn from(field: SortedSetFacetField) -> Self {
        FacetAnnotation::SortedSet(field)
    }
}

impl From<AssociationFacetField> for FacetAnnotation {
    fn from(field: AssociationFacetField) -> Self {
        FacetAnnotation::Association(field)
    }
}
