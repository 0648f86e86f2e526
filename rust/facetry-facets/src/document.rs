//! In-memory document model consumed and produced by the facet document builder.
//!
//! A document exposes two field streams, following what an index writer needs:
//! indexable fields (terms to put into the inverted index, plus facet
//! annotations awaiting translation) and stored fields (values kept per
//! document, including doc-values blobs used for counting).
//!
//! [`BuiltDocument`] borrows its source [`Document`] and chains the fields added
//! by the builder behind the original ones, so building never copies the
//! original field storage.

use crate::fields::FacetAnnotation;

/// An untokenized string indexed as a single term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringField {
    pub name: String,
    pub value: String,
}

/// A field visible to the inverted index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexableField {
    /// A single-term string field (indexed, not stored).
    String(StringField),
    /// A facet annotation; replaced by its encoded form when the document is built.
    Facet(FacetAnnotation),
}

impl IndexableField {
    pub fn name(&self) -> &str {
        match self {
            IndexableField::String(f) => &f.name,
            IndexableField::Facet(f) => f.dim(),
        }
    }

    pub fn is_facet(&self) -> bool {
        matches!(self, IndexableField::Facet(_))
    }

    /// Returns the term text for string fields.
    pub fn as_term(&self) -> Option<&str> {
        match self {
            IndexableField::String(f) => Some(&f.value),
            IndexableField::Facet(_) => None,
        }
    }
}

/// Value of a stored field.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    String(String),
    Int(i64),
    Float(f64),
    Binary(Vec<u8>),
    /// Per-document binary doc values (ordinal sets, association records).
    BinaryDocValues(Vec<u8>),
    /// One entry of a per-document sorted set of byte strings.
    SortedSetDocValues(Vec<u8>),
}

impl StoredValue {
    /// Returns the raw bytes of binary and doc-values variants.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Binary(b)
            | StoredValue::BinaryDocValues(b)
            | StoredValue::SortedSetDocValues(b) => Some(b),
            StoredValue::String(_) | StoredValue::Int(_) | StoredValue::Float(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredField {
    pub name: String,
    pub value: StoredValue,
}

impl StoredField {
    pub fn new(name: impl Into<String>, value: StoredValue) -> StoredField {
        StoredField {
            name: name.into(),
            value,
        }
    }
}

/// Read access to the two field streams of a document.
pub trait IndexDocument {
    fn indexable_fields(&self) -> Box<dyn Iterator<Item = &IndexableField> + '_>;

    fn stored_fields(&self) -> Box<dyn Iterator<Item = &StoredField> + '_>;
}

/// A source document, as assembled by the application.
#[derive(Debug, Clone, Default)]
pub struct Document {
    indexable: Vec<IndexableField>,
    stored: Vec<StoredField>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    pub fn add_indexable(&mut self, field: IndexableField) -> &mut Self {
        self.indexable.push(field);
        self
    }

    pub fn add_stored(&mut self, field: StoredField) -> &mut Self {
        self.stored.push(field);
        self
    }

    /// Adds an untokenized string term.
    pub fn add_string(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.add_indexable(IndexableField::String(StringField {
            name: name.into(),
            value: value.into(),
        }))
    }

    /// Adds a facet annotation of any kind.
    pub fn add_facet(&mut self, annotation: impl Into<FacetAnnotation>) -> &mut Self {
        self.add_indexable(IndexableField::Facet(annotation.into()))
    }

    /// Facet annotations in the order they were added.
    pub fn facets(&self) -> impl Iterator<Item = &FacetAnnotation> {
        self.indexable.iter().filter_map(|f| match f {
            IndexableField::Facet(annotation) => Some(annotation),
            IndexableField::String(_) => None,
        })
    }
}

impl IndexDocument for Document {
    fn indexable_fields(&self) -> Box<dyn Iterator<Item = &IndexableField> + '_> {
        Box::new(self.indexable.iter())
    }

    fn stored_fields(&self) -> Box<dyn Iterator<Item = &StoredField> + '_> {
        Box::new(self.stored.iter())
    }
}

/// The result of translating a [`Document`]'s facet annotations.
///
/// Exposes the source's non-facet indexable fields and all of its stored fields,
/// followed by the fields produced by the builder.
#[derive(Debug)]
pub struct BuiltDocument<'a> {
    source: &'a Document,
    added_indexable: Vec<IndexableField>,
    added_stored: Vec<StoredField>,
}

impl<'a> BuiltDocument<'a> {
    pub(crate) fn new(
        source: &'a Document,
        added_indexable: Vec<IndexableField>,
        added_stored: Vec<StoredField>,
    ) -> BuiltDocument<'a> {
        BuiltDocument {
            source,
            added_indexable,
            added_stored,
        }
    }

    pub fn source(&self) -> &'a Document {
        self.source
    }

    /// Fields added by the builder to the indexable stream.
    pub fn added_indexable(&self) -> &[IndexableField] {
        &self.added_indexable
    }

    /// Fields added by the builder to the stored stream.
    pub fn added_stored(&self) -> &[StoredField] {
        &self.added_stored
    }

    /// Terms indexed under `name`, in emission order.
    pub fn terms<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.indexable_fields()
            .filter(move |f| f.name() == name)
            .filter_map(IndexableField::as_term)
    }

    /// Stored values under `name`, in emission order.
    pub fn stored<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s StoredValue> + 's {
        self.stored_fields()
            .filter(move |f| f.name == name)
            .map(|f| &f.value)
    }
}

impl IndexDocument for BuiltDocument<'_> {
    fn indexable_fields(&self) -> Box<dyn Iterator<Item = &IndexableField> + '_> {
        Box::new(
            self.source
                .indexable
                .iter()
                .filter(|f| !f.is_facet())
                .chain(self.added_indexable.iter()),
        )
    }

    fn stored_fields(&self) -> Box<dyn Iterator<Item = &StoredField> + '_> {
        Box::new(self.source.stored.iter().chain(self.added_stored.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FacetField;

    #[test]
    fn test_built_document_hides_annotations() {
        let mut doc = Document::new();
        doc.add_string("id", "1")
            .add_facet(FacetField::new("Author", ["Bob"]).unwrap())
            .add_stored(StoredField::new("body", StoredValue::String("text".into())));
        assert_eq!(doc.facets().count(), 1);
        assert_eq!(doc.indexable_fields().count(), 2);

        let built = BuiltDocument::new(
            &doc,
            vec![IndexableField::String(StringField {
                name: "$facets".into(),
                value: "Author".into(),
            })],
            vec![StoredField::new("$facets", StoredValue::BinaryDocValues(vec![1]))],
        );
        let names: Vec<&str> = built.indexable_fields().map(|f| f.name()).collect();
        assert_eq!(names, ["id", "$facets"]);
        assert_eq!(built.stored_fields().count(), 2);
        assert_eq!(built.terms("$facets").collect::<Vec<_>>(), ["Author"]);
        assert_eq!(
            built.stored("$facets").next().and_then(StoredValue::as_bytes),
            Some(&[1u8][..])
        );
    }
}
