//! # Facet Document Builder
//!
//! Translates the facet annotations of a [`Document`] into plain index fields.
//!
//! ## Output
//!
//! For every target index field (as configured per dimension by
//! [`DimConfigStore`]):
//!
//! - **Facet fields** produce one drill-down term per label prefix (the
//!   dimension alone, then each deeper category), and one `BinaryDocValues`
//!   field holding the encoded set of the labels' ordinals. Multi-valued
//!   dimensions that are hierarchical or require a dimension count also carry
//!   their ancestors' ordinals, because counts for those cannot be rolled up at
//!   search time without double counting.
//! - **Sorted-set fields** produce a `SortedSetDocValues` entry with the encoded
//!   `dim/label` path plus two drill-down terms: the full path and the bare
//!   dimension. The taxonomy is not involved.
//! - **Association fields** produce one `BinaryDocValues` field of packed
//!   `[ordinal][value]` records. Ancestors are neither counted nor indexed as
//!   terms.
//!
//! ## Validation
//!
//! All dimension invariants are checked before the taxonomy is touched, so a
//! rejected document never creates categories. `build` either returns the whole
//! result or an error, never a partial document.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use ahash::{AHashMap, AHashSet};
use facetry_common::{Result, error::Error};

use crate::{
    associations::{self, AssociationKind},
    config::{DimConfig, DimConfigStore},
    document::{BuiltDocument, Document, IndexableField, StoredField, StoredValue, StringField},
    fields::{AssociationFacetField, FacetAnnotation, FacetField, SortedSetFacetField},
    label::FacetLabel,
    ordinals::{self, Ordinal},
    path_codec,
    taxonomy::TaxonomyWriter,
};

/// Turns documents carrying facet annotations into index-ready documents.
///
/// A builder is shared by all indexing threads: `build` takes `&self`, and the
/// only state it mutates (the per-field association kinds) is behind a lock.
pub struct FacetDocumentBuilder {
    /// Per-dimension settings, also read at query time by the application.
    config: Arc<DimConfigStore>,
    /// Ordinal assignment for facet and association fields. Documents that
    /// only carry sorted-set fields can be built without one.
    taxonomy: Option<Arc<dyn TaxonomyWriter>>,
    /// Value kind of the first association seen for each index field. Used only
    /// for best-effort detection of int/float/bytes associations mixed in one
    /// field.
    assoc_kinds: RwLock<AHashMap<String, AssociationKind>>,
}

/// Facet fields grouped by target index field, in a stable order.
type ByField<T> = BTreeMap<String, Vec<T>>;

struct FacetEntry<'d> {
    field: &'d FacetField,
    config: Arc<DimConfig>,
}

/// The annotations of one document, validated and grouped.
#[derive(Default)]
struct Partition<'d> {
    facets: ByField<FacetEntry<'d>>,
    sorted_sets: ByField<&'d SortedSetFacetField>,
    associations: ByField<&'d AssociationFacetField>,
    /// Association kind per index field, recorded in the shared tracker only
    /// once the document is built.
    assoc_kinds: AHashMap<String, AssociationKind>,
}

impl FacetDocumentBuilder {
    pub fn new(config: Arc<DimConfigStore>, taxonomy: Arc<dyn TaxonomyWriter>) -> Self {
        FacetDocumentBuilder {
            config,
            taxonomy: Some(taxonomy),
            assoc_kinds: Default::default(),
        }
    }

    /// Creates a builder that can only translate sorted-set fields. Documents
    /// with facet or association fields fail with a configuration error.
    pub fn without_taxonomy(config: Arc<DimConfigStore>) -> Self {
        FacetDocumentBuilder {
            config,
            taxonomy: None,
            assoc_kinds: Default::default(),
        }
    }

    pub fn config(&self) -> &Arc<DimConfigStore> {
        &self.config
    }

    /// Translates the facet annotations of `doc`.
    ///
    /// The returned document borrows `doc`: it exposes the non-facet fields of
    /// `doc` followed by the generated drill-down terms and doc-values fields.
    ///
    /// # Errors
    ///
    /// - Validation error: a non-multi-valued dimension appears more than once,
    ///   a facet path is deeper than one component on a non-hierarchical
    ///   dimension, an association targets a hierarchical or dim-count
    ///   dimension, or associations of different value kinds share an index
    ///   field.
    /// - Configuration error: an ordinal is needed but the builder has no
    ///   taxonomy.
    /// - Any error returned by the taxonomy, unchanged.
    pub fn build<'a>(&self, doc: &'a Document) -> Result<BuiltDocument<'a>> {
        let partition = self.partition(doc)?;

        let mut session = TaxonomySession::new(self.taxonomy.as_deref());
        let mut added_indexable = Vec::new();
        let mut added_stored = Vec::new();

        for (field_name, entries) in &partition.facets {
            process_facet_fields(
                field_name,
                entries,
                &mut session,
                &mut added_indexable,
                &mut added_stored,
            )?;
        }
        for (field_name, fields) in &partition.sorted_sets {
            process_sorted_set_fields(field_name, fields, &mut added_indexable, &mut added_stored);
        }
        for (field_name, fields) in &partition.associations {
            process_association_fields(field_name, fields, &mut session, &mut added_stored)?;
        }

        self.record_association_kinds(partition.assoc_kinds);

        log::debug!(
            "built document: {} facet annotations -> {} indexed, {} stored fields ({} taxonomy requests)",
            doc.facets().count(),
            added_indexable.len(),
            added_stored.len(),
            session.requests,
        );
        Ok(BuiltDocument::new(doc, added_indexable, added_stored))
    }

    /// Groups the annotations by target index field and enforces the
    /// per-dimension invariants.
    fn partition<'d>(&self, doc: &'d Document) -> Result<Partition<'d>> {
        let mut partition = Partition::default();
        let mut seen_dims = AHashSet::new();

        for annotation in doc.facets() {
            let dim_config = self.config.get(annotation.dim());
            match annotation {
                FacetAnnotation::Facet(field) => {
                    if !dim_config.multi_valued {
                        check_seen(&mut seen_dims, field.dim())?;
                    }
                    if field.path().len() > 1 && !dim_config.hierarchical {
                        return Err(Error::validation(format!(
                            "dimension \"{}\" is not hierarchical yet has {} components",
                            field.dim(),
                            field.path().len()
                        )));
                    }
                    partition
                        .facets
                        .entry(dim_config.index_field_name.clone())
                        .or_default()
                        .push(FacetEntry {
                            field,
                            config: dim_config,
                        });
                }
                FacetAnnotation::SortedSet(field) => {
                    if !dim_config.multi_valued {
                        check_seen(&mut seen_dims, field.dim())?;
                    }
                    partition
                        .sorted_sets
                        .entry(dim_config.index_field_name.clone())
                        .or_default()
                        .push(field);
                }
                FacetAnnotation::Association(field) => {
                    if dim_config.hierarchical {
                        return Err(Error::validation(format!(
                            "association facet cannot be hierarchical (dim=\"{}\")",
                            field.dim()
                        )));
                    }
                    if dim_config.require_dim_count {
                        return Err(Error::validation(format!(
                            "association facet cannot require dim count (dim=\"{}\")",
                            field.dim()
                        )));
                    }
                    let index_field_name = &dim_config.index_field_name;
                    let kind = field.value().kind();
                    match partition.assoc_kinds.get(index_field_name).copied() {
                        Some(current) => check_same_kind(index_field_name, current, kind)?,
                        None => {
                            self.check_association_kind(index_field_name, kind)?;
                            partition
                                .assoc_kinds
                                .insert(index_field_name.clone(), kind);
                        }
                    }
                    partition
                        .associations
                        .entry(index_field_name.clone())
                        .or_default()
                        .push(field);
                }
            }
        }
        Ok(partition)
    }

    /// Best-effort detection of association value kinds mixed in one index
    /// field, across all documents built by this builder.
    ///
    /// The lookup here and the insertion in `record_association_kinds` take the
    /// lock separately: two documents racing to be the first with different
    /// kinds on the same field may both pass. This check is a diagnostic, not a
    /// schema guarantee.
    fn check_association_kind(&self, index_field_name: &str, kind: AssociationKind) -> Result<()> {
        let current = self
            .assoc_kinds
            .read()
            .expect("read lock")
            .get(index_field_name)
            .copied();
        match current {
            Some(current) => check_same_kind(index_field_name, current, kind),
            None => Ok(()),
        }
    }

    /// Remembers the association kinds of a successfully built document.
    fn record_association_kinds(&self, kinds: AHashMap<String, AssociationKind>) {
        if kinds.is_empty() {
            return;
        }
        let mut tracked = self.assoc_kinds.write().expect("write lock");
        for (index_field_name, kind) in kinds {
            tracked.entry(index_field_name).or_insert_with_key(|name| {
                log::debug!("index field \"{name}\" holds {kind} associations");
                kind
            });
        }
    }
}

fn check_same_kind(
    index_field_name: &str,
    current: AssociationKind,
    kind: AssociationKind,
) -> Result<()> {
    if current == kind {
        return Ok(());
    }
    Err(Error::validation(format!(
        "mixing incompatible types of association facet ({current} and {kind}) in \
         indexed field \"{index_field_name}\"; use DimConfigStore to change the \
         index field name for each dimension"
    )))
}

fn check_seen<'d>(seen_dims: &mut AHashSet<&'d str>, dim: &'d str) -> Result<()> {
    if !seen_dims.insert(dim) {
        return Err(Error::validation(format!(
            "dimension \"{dim}\" is not multi-valued, but it appears more than once in this document"
        )));
    }
    Ok(())
}

fn drill_down_term(field_name: &str, term: String) -> IndexableField {
    IndexableField::String(StringField {
        name: field_name.to_string(),
        value: term,
    })
}

fn process_facet_fields<'d>(
    field_name: &str,
    entries: &[FacetEntry<'d>],
    session: &mut TaxonomySession<'d, '_>,
    added_indexable: &mut Vec<IndexableField>,
    added_stored: &mut Vec<StoredField>,
) -> Result<()> {
    let mut ordinals: Vec<Ordinal> = Vec::with_capacity(entries.len() * 2);

    for entry in entries {
        let label = entry.field.label();
        let ordinal = session.add_category(label)?;
        ordinals.push(ordinal);

        let config = &entry.config;
        if config.multi_valued && (config.hierarchical || config.require_dim_count) {
            let first_ancestor = ordinals.len();
            let mut parent = session.get_parent(ordinal)?;
            while parent > 0 {
                ordinals.push(parent);
                parent = session.get_parent(parent)?;
            }
            if !config.require_dim_count && ordinals.len() > first_ancestor {
                // The topmost ancestor is the dimension itself.
                ordinals.pop();
            }
        }

        for len in 1..=label.len() {
            added_indexable.push(drill_down_term(field_name, label.encode_prefix(len)));
        }
    }

    let encoded = ordinals::dedup_and_encode(&mut ordinals)?;
    added_stored.push(StoredField::new(
        field_name,
        StoredValue::BinaryDocValues(encoded),
    ));
    Ok(())
}

fn process_sorted_set_fields(
    field_name: &str,
    fields: &[&SortedSetFacetField],
    added_indexable: &mut Vec<IndexableField>,
    added_stored: &mut Vec<StoredField>,
) {
    for field in fields {
        let full_path = path_codec::encode_path(&[field.dim(), field.label()]);

        added_stored.push(StoredField::new(
            field_name,
            StoredValue::SortedSetDocValues(full_path.clone().into_bytes()),
        ));

        added_indexable.push(drill_down_term(field_name, full_path));
        added_indexable.push(drill_down_term(field_name, field.dim().to_string()));
    }
}

fn process_association_fields<'d>(
    field_name: &str,
    fields: &[&'d AssociationFacetField],
    session: &mut TaxonomySession<'d, '_>,
    added_stored: &mut Vec<StoredField>,
) -> Result<()> {
    let mut bytes = Vec::with_capacity(16);
    for field in fields {
        let ordinal = session.add_category(field.label())?;
        associations::write_record(ordinal, field.value(), &mut bytes);
    }
    added_stored.push(StoredField::new(
        field_name,
        StoredValue::BinaryDocValues(bytes),
    ));
    Ok(())
}

/// Taxonomy access scoped to one `build` call: every distinct label and every
/// parent link is requested at most once per document.
struct TaxonomySession<'d, 't> {
    taxonomy: Option<&'t dyn TaxonomyWriter>,
    ordinals: AHashMap<&'d FacetLabel, Ordinal>,
    parents: AHashMap<Ordinal, Ordinal>,
    requests: usize,
}

impl<'d, 't> TaxonomySession<'d, 't> {
    fn new(taxonomy: Option<&'t dyn TaxonomyWriter>) -> Self {
        TaxonomySession {
            taxonomy,
            ordinals: AHashMap::new(),
            parents: AHashMap::new(),
            requests: 0,
        }
    }

    fn taxonomy(&self) -> Result<&'t dyn TaxonomyWriter> {
        self.taxonomy.ok_or_else(|| {
            Error::configuration(
                "a taxonomy writer must be provided to the builder when using facet or \
                 association fields",
            )
        })
    }

    fn add_category(&mut self, label: &'d FacetLabel) -> Result<Ordinal> {
        let taxonomy = self.taxonomy()?;
        if let Some(&ordinal) = self.ordinals.get(label) {
            return Ok(ordinal);
        }
        self.requests += 1;
        let ordinal = taxonomy.add_category(label)?;
        log::trace!("add_category({label}) -> {ordinal}");
        self.ordinals.insert(label, ordinal);
        Ok(ordinal)
    }

    fn get_parent(&mut self, ordinal: Ordinal) -> Result<Ordinal> {
        let taxonomy = self.taxonomy()?;
        if let Some(&parent) = self.parents.get(&ordinal) {
            return Ok(parent);
        }
        self.requests += 1;
        let parent = taxonomy.get_parent(ordinal)?;
        self.parents.insert(ordinal, parent);
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        associations::AssociationValue, document::IndexDocument, ordinals::decode_ordinal_set,
        taxonomy::memory::MemoryTaxonomy,
    };

    /// Counts taxonomy calls to verify per-build memoization.
    #[derive(Default)]
    struct CountingTaxonomy {
        inner: MemoryTaxonomy,
        adds: std::sync::atomic::AtomicUsize,
        parents: std::sync::atomic::AtomicUsize,
    }

    impl TaxonomyWriter for CountingTaxonomy {
        fn add_category(&self, label: &FacetLabel) -> Result<Ordinal> {
            self.adds.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            self.inner.add_category(label)
        }

        fn get_parent(&self, ordinal: Ordinal) -> Result<Ordinal> {
            self.parents.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            self.inner.get_parent(ordinal)
        }
    }

    fn builder_with(config: DimConfigStore) -> (FacetDocumentBuilder, Arc<MemoryTaxonomy>) {
        let taxonomy = Arc::new(MemoryTaxonomy::new());
        let builder = FacetDocumentBuilder::new(Arc::new(config), taxonomy.clone());
        (builder, taxonomy)
    }

    fn ordinal_of(taxonomy: &MemoryTaxonomy, components: &[&str]) -> Ordinal {
        let label =
            FacetLabel::from_components(components.iter().map(|s| s.to_string()).collect())
                .unwrap();
        taxonomy.ordinal(&label).expect("category exists")
    }

    #[test]
    fn test_flat_facet_terms_and_ordinals() {
        let (builder, taxonomy) = builder_with(DimConfigStore::new());
        let mut doc = Document::new();
        doc.add_facet(FacetField::new("Author", ["Bob"]).unwrap());

        let built = builder.build(&doc).unwrap();
        let terms: Vec<&str> = built.terms("$facets").collect();
        assert_eq!(terms, ["Author", "Author\u{1F}Bob"]);

        let blob = built.stored("$facets").next().unwrap().as_bytes().unwrap();
        assert_eq!(
            decode_ordinal_set(blob).unwrap(),
            vec![ordinal_of(&taxonomy, &["Author", "Bob"])]
        );
    }

    #[test]
    fn test_flat_multi_valued_keeps_only_leaf_ordinals() {
        let config = DimConfigStore::new();
        config.set_multi_valued("Author", true);
        let (builder, taxonomy) = builder_with(config);
        let mut doc = Document::new();
        doc.add_facet(FacetField::new("Author", ["Bob"]).unwrap())
            .add_facet(FacetField::new("Author", ["Lisa"]).unwrap());

        let built = builder.build(&doc).unwrap();
        let blob = built.stored("$facets").next().unwrap().as_bytes().unwrap();
        assert_eq!(
            decode_ordinal_set(blob).unwrap(),
            vec![
                ordinal_of(&taxonomy, &["Author", "Bob"]),
                ordinal_of(&taxonomy, &["Author", "Lisa"]),
            ]
        );
    }

    #[test]
    fn test_require_dim_count_keeps_dimension_ordinal() {
        let config = DimConfigStore::new();
        config.set_multi_valued("Tag", true);
        config.set_require_dim_count("Tag", true);
        let (builder, taxonomy) = builder_with(config);
        let mut doc = Document::new();
        doc.add_facet(FacetField::new("Tag", ["rust"]).unwrap());

        let built = builder.build(&doc).unwrap();
        let blob = built.stored("$facets").next().unwrap().as_bytes().unwrap();
        assert_eq!(
            decode_ordinal_set(blob).unwrap(),
            vec![
                ordinal_of(&taxonomy, &["Tag"]),
                ordinal_of(&taxonomy, &["Tag", "rust"]),
            ]
        );
    }

    #[test]
    fn test_single_valued_hierarchical_has_no_ancestors() {
        let config = DimConfigStore::new();
        config.set_hierarchical("Date", true);
        let (builder, taxonomy) = builder_with(config);
        let mut doc = Document::new();
        doc.add_facet(FacetField::new("Date", ["2020", "03"]).unwrap());

        let built = builder.build(&doc).unwrap();
        let blob = built.stored("$facets").next().unwrap().as_bytes().unwrap();
        assert_eq!(
            decode_ordinal_set(blob).unwrap(),
            vec![ordinal_of(&taxonomy, &["Date", "2020", "03"])]
        );
    }

    #[test]
    fn test_sorted_set_fields() {
        let builder = FacetDocumentBuilder::without_taxonomy(Arc::new(DimConfigStore::new()));
        let mut doc = Document::new();
        doc.add_facet(SortedSetFacetField::new("Genre", "SciFi").unwrap());

        let built = builder.build(&doc).unwrap();
        assert_eq!(
            built.terms("$facets").collect::<Vec<_>>(),
            ["Genre\u{1F}SciFi", "Genre"]
        );
        assert_eq!(
            built.stored("$facets").collect::<Vec<_>>(),
            [&StoredValue::SortedSetDocValues(b"Genre\x1fSciFi".to_vec())]
        );
    }

    #[test]
    fn test_association_records() {
        let (builder, taxonomy) = builder_with(DimConfigStore::new());
        let mut doc = Document::new();
        doc.add_facet(AssociationFacetField::int("Rating", ["stars"], 4).unwrap())
            .add_facet(AssociationFacetField::int("Votes", ["up"], 17).unwrap());

        let built = builder.build(&doc).unwrap();
        // No drill-down terms for associations.
        assert_eq!(built.terms("$facets").count(), 0);

        let blob = built.stored("$facets").next().unwrap().as_bytes().unwrap();
        let records = associations::AssociationRecords::new(blob).unwrap();
        assert_eq!(
            records.int_records().collect::<Vec<_>>(),
            vec![
                (ordinal_of(&taxonomy, &["Rating", "stars"]), 4),
                (ordinal_of(&taxonomy, &["Votes", "up"]), 17),
            ]
        );
    }

    #[test]
    fn test_association_bytes_payload() {
        let (builder, taxonomy) = builder_with(DimConfigStore::new());
        let mut doc = Document::new();
        doc.add_facet(
            AssociationFacetField::new("Blob", ["b"], AssociationValue::Bytes(vec![1, 2, 3]))
                .unwrap(),
        );
        let built = builder.build(&doc).unwrap();
        let blob = built.stored("$facets").next().unwrap().as_bytes().unwrap();
        let ordinal = ordinal_of(&taxonomy, &["Blob", "b"]) as u8;
        assert_eq!(blob, [0, 0, 0, ordinal, 1, 2, 3]);
    }

    #[test]
    fn test_association_on_hierarchical_or_dim_count_rejected() {
        let config = DimConfigStore::new();
        config.set_hierarchical("H", true);
        config.set_require_dim_count("C", true);
        let (builder, taxonomy) = builder_with(config);

        for dim in ["H", "C"] {
            let mut doc = Document::new();
            doc.add_facet(AssociationFacetField::int(dim, ["x"], 1).unwrap());
            assert!(builder.build(&doc).unwrap_err().is_validation());
        }
        assert!(taxonomy.is_empty());
    }

    #[test]
    fn test_validation_precedes_taxonomy_calls() {
        let (builder, taxonomy) = builder_with(DimConfigStore::new());
        let mut doc = Document::new();
        doc.add_facet(FacetField::new("Author", ["Bob"]).unwrap())
            .add_facet(FacetField::new("Date", ["2020", "03"]).unwrap());

        let err = builder.build(&doc).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("not hierarchical"));
        assert!(taxonomy.is_empty());
    }

    #[test]
    fn test_session_memoizes_taxonomy_calls() {
        let config = DimConfigStore::new();
        config.set_hierarchical("A", true);
        config.set_multi_valued("A", true);
        let taxonomy = Arc::new(CountingTaxonomy::default());
        let builder = FacetDocumentBuilder::new(Arc::new(config), taxonomy.clone());

        let mut doc = Document::new();
        doc.add_facet(FacetField::new("A", ["x", "y"]).unwrap())
            .add_facet(FacetField::new("A", ["x", "y"]).unwrap())
            .add_facet(FacetField::new("A", ["x", "z"]).unwrap());
        let built = builder.build(&doc).unwrap();

        use std::sync::atomic::Ordering;
        assert_eq!(taxonomy.adds.load(Ordering::Relaxed), 2);
        // Parents of x/y, x/z, then x, then A (root reached).
        assert_eq!(taxonomy.parents.load(Ordering::Relaxed), 4);

        // Terms are still emitted per annotation.
        assert_eq!(built.terms("$facets").count(), 9);
    }

    #[test]
    fn test_non_facet_fields_preserved() {
        let (builder, _) = builder_with(DimConfigStore::new());
        let mut doc = Document::new();
        doc.add_string("id", "42")
            .add_stored(StoredField::new("price", StoredValue::Float(9.5)))
            .add_facet(FacetField::new("Author", ["Bob"]).unwrap());

        let built = builder.build(&doc).unwrap();
        let indexable: Vec<&IndexableField> = built.indexable_fields().collect();
        assert_eq!(indexable.len(), 3);
        assert_eq!(indexable[0].name(), "id");
        assert!(indexable.iter().all(|f| !f.is_facet()));

        let stored: Vec<&str> = built.stored_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(stored, ["price", "$facets"]);
    }

    #[test]
    fn test_document_without_facets() {
        let builder = FacetDocumentBuilder::without_taxonomy(Arc::new(DimConfigStore::new()));
        let mut doc = Document::new();
        doc.add_string("id", "1");
        let built = builder.build(&doc).unwrap();
        assert!(built.added_indexable().is_empty());
        assert!(built.added_stored().is_empty());
        assert_eq!(built.indexable_fields().count(), 1);
    }
}
