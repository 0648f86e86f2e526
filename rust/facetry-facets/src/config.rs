//! Per-dimension facet configuration.
//!
//! By default a dimension is flat, single valued, does not require a count for
//! the dimension itself, and is indexed into [`DEFAULT_INDEX_FIELD_NAME`]. Use the
//! setters of [`DimConfigStore`] to change these settings for any dimension.
//!
//! **Note**: this configuration is not saved into the index. The application must
//! make sure the configuration used at search time matches the one used during
//! indexing.
//!
//! # Thread Safety
//!
//! Entries are immutable `Arc<DimConfig>` values held in a `RwLock`-protected map.
//! Setters replace an entry with an updated copy, so a reader holding an entry
//! never sees a mix of old and new settings.

use std::{
    collections::BTreeMap,
    sync::{Arc, LazyLock, RwLock},
};

use ahash::AHashMap;
use facetry_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

use crate::path_codec;

/// Index field that receives a dimension's terms and counting payload unless
/// configured otherwise.
pub const DEFAULT_INDEX_FIELD_NAME: &str = "$facets";

/// Settings of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimConfig {
    /// True if this dimension is hierarchical.
    pub hierarchical: bool,

    /// True if this dimension is multi-valued.
    pub multi_valued: bool,

    /// True if the count/aggregate for the entire dimension is required, which
    /// is unusual (default is false).
    pub require_dim_count: bool,

    /// Actual field where this dimension's facet labels are indexed.
    pub index_field_name: String,
}

impl Default for DimConfig {
    fn default() -> Self {
        DimConfig {
            hierarchical: false,
            multi_valued: false,
            require_dim_count: false,
            index_field_name: DEFAULT_INDEX_FIELD_NAME.to_string(),
        }
    }
}

static DEFAULT_DIM_CONFIG: LazyLock<Arc<DimConfig>> =
    LazyLock::new(|| Arc::new(DimConfig::default()));

/// A query-side drill-down term: the field and term a document indexed with the
/// corresponding label can be found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDownTerm {
    pub field: String,
    pub term: String,
}

/// Maps dimension names to their [`DimConfig`].
#[derive(Debug, Default)]
pub struct DimConfigStore {
    dims: RwLock<AHashMap<String, Arc<DimConfig>>>,
}

impl DimConfigStore {
    pub fn new() -> DimConfigStore {
        DimConfigStore::default()
    }

    /// Loads a store from a JSON object mapping dimension names to (possibly
    /// partial) [`DimConfig`] objects, e.g.
    /// `{"Date": {"hierarchical": true, "multi_valued": true}}`.
    pub fn from_json(json: &str) -> Result<DimConfigStore> {
        let dims: BTreeMap<String, DimConfig> = serde_json::from_str(json)
            .map_err(|e| Error::invalid_arg("json", format!("invalid dimension config: {e}")))?;
        let store = DimConfigStore::new();
        for (dim, config) in dims {
            store.set_dim_config(dim, config);
        }
        Ok(store)
    }

    /// Returns the configuration of `dim`, or the shared default if `dim` was
    /// never configured.
    pub fn get(&self, dim: &str) -> Arc<DimConfig> {
        self.dims
            .read()
            .expect("read lock")
            .get(dim)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&DEFAULT_DIM_CONFIG))
    }

    /// The configuration used for dimensions without an explicit entry.
    pub fn default_config() -> Arc<DimConfig> {
        Arc::clone(&DEFAULT_DIM_CONFIG)
    }

    /// Replaces the whole entry of `dim`.
    pub fn set_dim_config(&self, dim: impl Into<String>, config: DimConfig) {
        self.dims
            .write()
            .expect("write lock")
            .insert(dim.into(), Arc::new(config));
    }

    pub fn set_hierarchical(&self, dim: &str, hierarchical: bool) {
        self.update(dim, |c| c.hierarchical = hierarchical);
    }

    pub fn set_multi_valued(&self, dim: &str, multi_valued: bool) {
        self.update(dim, |c| c.multi_valued = multi_valued);
    }

    pub fn set_require_dim_count(&self, dim: &str, require_dim_count: bool) {
        self.update(dim, |c| c.require_dim_count = require_dim_count);
    }

    pub fn set_index_field_name(&self, dim: &str, index_field_name: impl Into<String>) {
        let index_field_name = index_field_name.into();
        self.update(dim, move |c| c.index_field_name = index_field_name);
    }

    /// Copy-on-write upsert: the existing entry (or the defaults) is cloned,
    /// modified, and swapped in under the write lock.
    fn update(&self, dim: &str, apply: impl FnOnce(&mut DimConfig)) {
        let mut dims = self.dims.write().expect("write lock");
        let mut config = match dims.get(dim) {
            Some(existing) => DimConfig::clone(existing),
            None => DimConfig::default(),
        };
        apply(&mut config);
        dims.insert(dim.to_string(), Arc::new(config));
    }

    /// Returns a sorted copy of all explicitly configured dimensions.
    pub fn snapshot(&self) -> BTreeMap<String, DimConfig> {
        self.dims
            .read()
            .expect("read lock")
            .iter()
            .map(|(dim, config)| (dim.clone(), DimConfig::clone(config)))
            .collect()
    }

    /// Serializes [`DimConfigStore::snapshot`] in the format accepted by
    /// [`DimConfigStore::from_json`].
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| Error::invalid_arg("config", format!("failed to serialize: {e}")))
    }

    /// Returns the field and term to query for documents indexed with the label
    /// `dim/path...`.
    pub fn drill_down_term<S: AsRef<str>>(&self, dim: &str, path: &[S]) -> DrillDownTerm {
        DrillDownTerm {
            field: self.get(dim).index_field_name.clone(),
            term: path_codec::encode_dim_path(dim, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let store = DimConfigStore::new();
        let config = store.get("Author");
        assert_eq!(*config, DimConfig::default());
        assert_eq!(config.index_field_name, DEFAULT_INDEX_FIELD_NAME);
        assert!(Arc::ptr_eq(&config, &DimConfigStore::default_config()));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_setters_upsert_single_setting() {
        let store = DimConfigStore::new();
        store.set_hierarchical("Date", true);
        store.set_multi_valued("Date", true);
        store.set_index_field_name("Date", "$dates");

        let config = store.get("Date");
        assert!(config.hierarchical);
        assert!(config.multi_valued);
        assert!(!config.require_dim_count);
        assert_eq!(config.index_field_name, "$dates");

        // Idempotent.
        store.set_hierarchical("Date", true);
        assert_eq!(*store.get("Date"), *config);

        // Unrelated dimensions keep the defaults.
        assert_eq!(*store.get("Author"), DimConfig::default());
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = DimConfigStore::new();
        store.set_multi_valued("Tag", true);
        let before = store.get("Tag");
        store.set_require_dim_count("Tag", true);
        assert!(!before.require_dim_count);
        assert!(store.get("Tag").require_dim_count);
    }

    #[test]
    fn test_json_round_trip() {
        let store = DimConfigStore::from_json(
            r#"{"Date": {"hierarchical": true}, "Tag": {"multi_valued": true, "index_field_name": "$tags"}}"#,
        )
        .unwrap();
        assert!(store.get("Date").hierarchical);
        assert_eq!(store.get("Date").index_field_name, DEFAULT_INDEX_FIELD_NAME);
        assert_eq!(store.get("Tag").index_field_name, "$tags");

        let reloaded = DimConfigStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());

        assert!(DimConfigStore::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_drill_down_term() {
        let store = DimConfigStore::new();
        store.set_index_field_name("Author", "$authors");
        let term = store.drill_down_term("Author", &["Bob"]);
        assert_eq!(term.field, "$authors");
        assert_eq!(term.term, "Author\u{1F}Bob");
        assert_eq!(store.drill_down_term::<&str>("Date", &[]).term, "Date");
    }
}
