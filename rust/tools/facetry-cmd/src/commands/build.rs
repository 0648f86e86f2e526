//! Build command implementation
//!
//! Reads newline-delimited JSON documents of the form
//!
//! ```json
//! {"fields": {"title": "..."},
//!  "facets": [{"dim": "Author", "path": ["Bob"]},
//!             {"dim": "Genre", "label": "SciFi"},
//!             {"dim": "Rating", "path": ["stars"], "int": 4}]}
//! ```
//!
//! builds each one against a shared in-memory taxonomy and prints the
//! resulting fields as one JSON object per line. Binary payloads are printed as
//! hex, terms with the delimiter and escape characters shown as `\x1f`/`\x1e`.

use anyhow::{Context, Result, bail};
use facetry_facets::{
    AssociationFacetField, AssociationValue, BuiltDocument, DimConfigStore, Document,
    FacetAnnotation, FacetDocumentBuilder, FacetField, IndexDocument, MemoryTaxonomy,
    SortedSetFacetField, StoredValue,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use crate::utils;

pub fn run(config_path: Option<String>, source_file: String, skip_invalid: bool) -> Result<()> {
    let config = load_config(config_path.as_deref())?;

    utils::validate_file_exists(&source_file)
        .with_context(|| format!("Invalid source file: {}", source_file))?;
    let file = File::open(&source_file)
        .with_context(|| format!("Failed to open source file: {}", source_file))?;

    let taxonomy = Arc::new(MemoryTaxonomy::new());
    let builder = FacetDocumentBuilder::new(Arc::new(config), taxonomy.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = build_documents(&builder, BufReader::new(file), skip_invalid, &mut out)?;
    out.flush()?;

    eprintln!(
        "Built {} documents ({} rejected), {} categories in taxonomy",
        summary.built,
        summary.rejected,
        taxonomy.len()
    );
    Ok(())
}

pub fn load_config(config_path: Option<&str>) -> Result<DimConfigStore> {
    let Some(path) = config_path else {
        return Ok(DimConfigStore::new());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;
    DimConfigStore::from_json(&json)
        .with_context(|| format!("Failed to parse config file: {}", path))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub built: usize,
    pub rejected: usize,
}

/// Builds every non-blank line of `reader` and writes one JSON line per built
/// document to `out`.
///
/// Documents rejected by validation are skipped when `skip_invalid` is set;
/// every other failure stops the run.
pub fn build_documents<R: BufRead, W: Write>(
    builder: &FacetDocumentBuilder,
    reader: R,
    skip_invalid: bool,
    out: &mut W,
) -> Result<BuildSummary> {
    let mut summary = BuildSummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let source: SourceDocument = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {line_no}"))?;
        let doc = source
            .to_document()
            .with_context(|| format!("Invalid document on line {line_no}"))?;

        match builder.build(&doc) {
            Ok(built) => {
                serde_json::to_writer(&mut *out, &BuiltOutput::new(line_no, &built))?;
                writeln!(out)?;
                summary.built += 1;
            }
            Err(e) if skip_invalid && e.is_validation() => {
                eprintln!("Skipping line {line_no}: {e}");
                summary.rejected += 1;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to build document on line {line_no}"));
            }
        }
    }
    Ok(summary)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceDocument {
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    facets: Vec<SourceFacet>,
}

/// One facet annotation. `label` selects a sorted-set facet; `int`, `float` or
/// `bytes` (hex) select an association; otherwise it is a taxonomy facet.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceFacet {
    dim: String,
    #[serde(default)]
    path: Vec<String>,
    label: Option<String>,
    int: Option<i32>,
    float: Option<f32>,
    bytes: Option<String>,
}

impl SourceDocument {
    fn to_document(&self) -> Result<Document> {
        let mut doc = Document::new();
        for (name, value) in &self.fields {
            doc.add_string(name.as_str(), value.as_str());
        }
        for facet in &self.facets {
            doc.add_facet(facet.to_annotation()?);
        }
        Ok(doc)
    }
}

impl SourceFacet {
    fn to_annotation(&self) -> Result<FacetAnnotation> {
        let value = match (self.int, self.float, &self.bytes) {
            (None, None, None) => None,
            (Some(v), None, None) => Some(AssociationValue::Int(v)),
            (None, Some(v), None) => Some(AssociationValue::Float(v)),
            (None, None, Some(hex)) => Some(AssociationValue::Bytes(utils::from_hex(hex)?)),
            _ => bail!("Facet on \"{}\" has more than one association value", self.dim),
        };

        let annotation = match (&self.label, value) {
            (Some(label), None) => {
                if !self.path.is_empty() {
                    bail!("Facet on \"{}\" has both a label and a path", self.dim);
                }
                SortedSetFacetField::new(self.dim.as_str(), label.as_str())?.into()
            }
            (Some(_), Some(_)) => {
                bail!("Sorted-set facet on \"{}\" cannot carry a value", self.dim)
            }
            (None, Some(value)) => AssociationFacetField::new(&self.dim, &self.path, value)?.into(),
            (None, None) => FacetField::new(&self.dim, &self.path)?.into(),
        };
        Ok(annotation)
    }
}

#[derive(Serialize)]
struct BuiltOutput {
    line: usize,
    indexed: Vec<IndexedOutput>,
    stored: Vec<StoredOutput>,
}

#[derive(Serialize)]
struct IndexedOutput {
    field: String,
    term: String,
}

#[derive(Serialize)]
struct StoredOutput {
    field: String,
    kind: &'static str,
    value: Value,
}

impl BuiltOutput {
    fn new(line: usize, built: &BuiltDocument) -> BuiltOutput {
        let indexed = built
            .indexable_fields()
            .filter_map(|f| {
                f.as_term().map(|term| IndexedOutput {
                    field: f.name().to_string(),
                    term: utils::escape_control(term),
                })
            })
            .collect();

        let stored = built
            .stored_fields()
            .map(|f| {
                let (kind, value) = match &f.value {
                    StoredValue::String(s) => ("string", json!(s)),
                    StoredValue::Int(v) => ("int", json!(v)),
                    StoredValue::Float(v) => ("float", json!(v)),
                    StoredValue::Binary(b) => ("binary", json!(utils::to_hex(b))),
                    StoredValue::BinaryDocValues(b) => {
                        ("binary_doc_values", json!(utils::to_hex(b)))
                    }
                    StoredValue::SortedSetDocValues(b) => {
                        ("sorted_set_doc_values", json!(utils::to_hex(b)))
                    }
                };
                StoredOutput {
                    field: f.name.clone(),
                    kind,
                    value,
                }
            })
            .collect();

        BuiltOutput {
            line,
            indexed,
            stored,
        }
    }
}
