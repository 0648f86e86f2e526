//! In-memory taxonomy.
//!
//! Ordinals are assigned densely in creation order. Ordinal `0` is the root; a
//! label's ancestors are always created before the label itself, so every parent
//! ordinal is smaller than its children.

use std::sync::RwLock;

use ahash::AHashMap;
use facetry_common::Result;

use crate::{
    label::FacetLabel,
    ordinals::{INVALID_ORDINAL, Ordinal, ROOT_ORDINAL},
    taxonomy::TaxonomyWriter,
};

#[derive(Debug)]
struct Inner {
    ordinals: AHashMap<FacetLabel, Ordinal>,
    /// Indexed by ordinal; slot 0 is the root.
    parents: Vec<Ordinal>,
    /// Indexed by ordinal; slot 0 (the root) has no label.
    labels: Vec<Option<FacetLabel>>,
}

impl Inner {
    fn new() -> Inner {
        Inner {
            ordinals: AHashMap::new(),
            parents: vec![INVALID_ORDINAL],
            labels: vec![None],
        }
    }

    fn add(&mut self, label: &FacetLabel) -> Ordinal {
        if let Some(&ordinal) = self.ordinals.get(label) {
            return ordinal;
        }
        let mut parent = ROOT_ORDINAL;
        for len in 1..label.len() {
            parent = self.add_child(label.subpath(len), parent);
        }
        self.add_child(label.clone(), parent)
    }

    fn add_child(&mut self, label: FacetLabel, parent: Ordinal) -> Ordinal {
        if let Some(&ordinal) = self.ordinals.get(&label) {
            return ordinal;
        }
        let ordinal = self.parents.len() as Ordinal;
        log::trace!("taxonomy: new category {label} -> {ordinal} (parent {parent})");
        self.parents.push(parent);
        self.labels.push(Some(label.clone()));
        self.ordinals.insert(label, ordinal);
        ordinal
    }
}

/// A thread-safe [`TaxonomyWriter`] kept entirely in memory.
#[derive(Debug)]
pub struct MemoryTaxonomy {
    inner: RwLock<Inner>,
}

impl MemoryTaxonomy {
    pub fn new() -> MemoryTaxonomy {
        MemoryTaxonomy {
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Ordinal of `label`, if it was created.
    pub fn ordinal(&self, label: &FacetLabel) -> Option<Ordinal> {
        self.inner.read().expect("read lock").ordinals.get(label).copied()
    }

    /// Label of `ordinal`; `None` for the root and unknown ordinals.
    pub fn label(&self, ordinal: Ordinal) -> Option<FacetLabel> {
        let inner = self.inner.read().expect("read lock");
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| inner.labels.get(idx))
            .and_then(|label| label.clone())
    }

    /// Number of ordinals, root included.
    pub fn len(&self) -> usize {
        self.inner.read().expect("read lock").parents.len()
    }

    /// `true` if nothing but the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

impl Default for MemoryTaxonomy {
    fn default() -> Self {
        MemoryTaxonomy::new()
    }
}

impl TaxonomyWriter for MemoryTaxonomy {
    fn add_category(&self, label: &FacetLabel) -> Result<Ordinal> {
        if let Some(ordinal) = self.ordinal(label) {
            return Ok(ordinal);
        }
        // `Inner::add` re-checks under the write lock, so a label raced by
        // several writers is created once.
        Ok(self.inner.write().expect("write lock").add(label))
    }

    fn get_parent(&self, ordinal: Ordinal) -> Result<Ordinal> {
        let inner = self.inner.read().expect("read lock");
        Ok(usize::try_from(ordinal)
            .ok()
            .and_then(|idx| inner.parents.get(idx))
            .copied()
            .unwrap_or(INVALID_ORDINAL))
    }
}
