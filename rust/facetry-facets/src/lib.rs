//! Faceted document transformation for search indexing.
//!
//! This crate rewrites a logical document annotated with facet labels into the
//! low-level field set an index writer understands:
//!
//! - **Drill-down terms**: untokenized string terms, one per label prefix, so that
//!   a query can filter documents by any node of a facet hierarchy.
//! - **Counting payloads**: one compact binary blob per target index field, holding
//!   either a delta/variable-length encoded ordinal set or packed association
//!   records (`[ordinal][value]`).
//!
//! # Building blocks
//!
//! - [`DimConfigStore`]: per-dimension configuration (hierarchy, multiplicity,
//!   dimension count, target index field), shared across threads.
//! - [`path_codec`]: reversible, delimiter-safe encoding of a label path into a
//!   single string.
//! - [`ordinals`]: deduplicating delta encoding of ordinal sets.
//! - [`TaxonomyWriter`]: the ordinal-assignment collaborator; [`MemoryTaxonomy`]
//!   is the in-process implementation.
//! - [`FacetDocumentBuilder`]: the per-document transformation.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use facetry_facets::{
//!     DimConfigStore, Document, FacetDocumentBuilder, FacetField, IndexDocument, MemoryTaxonomy,
//! };
//!
//! let config = Arc::new(DimConfigStore::new());
//! config.set_hierarchical("Date", true);
//!
//! let builder = FacetDocumentBuilder::new(config, Arc::new(MemoryTaxonomy::new()));
//!
//! let mut doc = Document::new();
//! doc.add_string("title", "Lucene in Action");
//! doc.add_facet(FacetField::new("Date", ["2010", "10"]).unwrap());
//!
//! let built = builder.build(&doc).unwrap();
//! // "title" plus three drill-down terms: Date, Date/2010, Date/2010/10.
//! assert_eq!(built.indexable_fields().count(), 4);
//! ```

pub mod associations;
pub mod builder;
pub mod config;
pub mod document;
pub mod fields;
pub mod label;
pub mod ordinals;
pub mod path_codec;
pub mod taxonomy;

pub use associations::{AssociationKind, AssociationRecords, AssociationValue};
pub use builder::FacetDocumentBuilder;
pub use config::{DEFAULT_INDEX_FIELD_NAME, DimConfig, DimConfigStore, DrillDownTerm};
pub use document::{
    BuiltDocument, Document, IndexDocument, IndexableField, StoredField, StoredValue, StringField,
};
pub use fields::{AssociationFacetField, FacetAnnotation, FacetField, SortedSetFacetField};
pub use label::FacetLabel;
pub use ordinals::{INVALID_ORDINAL, Ordinal, OrdinalSetDecoder, ROOT_ORDINAL};
pub use taxonomy::{TaxonomyWriter, memory::MemoryTaxonomy};
