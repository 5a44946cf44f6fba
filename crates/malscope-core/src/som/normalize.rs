//! SOM document normalization.
//!
//! SOM exports arrive in whatever shape the exporting notebook produced: a
//! bare array of cells, an object keyed `"0"`, `"1"`, ..., or the cell array
//! buried a few levels down inside metadata wrappers. Field names vary too
//! (`row`/`r`/`i`/`y`, `col`/`column`/`c`/`j`/`x`).
//!
//! The normalizer tries the candidate shapes in priority order:
//!
//! 1. root is an array → the array
//! 2. root is an index-keyed object → its values, sorted by numeric key
//! 3. bounded depth-first search for a nested array of objects (or a nested
//!    index-keyed object)
//!
//! and then decodes each candidate into a [`GridCell`], degrading bad fields
//! to defaults instead of failing. The result may be empty; that is the
//! "no usable grid data" answer, not an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::types::GridCell;
use crate::coerce::{finite_or, first_present};
use crate::label_map::LabelMap;

/// Deepest nesting level searched for a nested cell array.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Field aliases for the row coordinate, in lookup order.
pub const ROW_ALIASES: &[&str] = &["row", "r", "i", "y"];

/// Field aliases for the column coordinate, in lookup order.
pub const COL_ALIASES: &[&str] = &["col", "column", "c", "j", "x"];

/// Normalizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Nesting levels searched below the root (default: 6)
    pub max_depth: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Which shape the candidate cell list was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateShape {
    /// The root itself is an array
    FlatArray,
    /// The root is an object keyed by "0", "1", ...
    IndexObject,
    /// Found by searching nested properties, at this depth
    Nested { depth: usize },
}

/// A located list of raw cells, not yet decoded.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub shape: CandidateShape,
    pub items: Vec<&'a Value>,
}

/// Converts arbitrarily shaped SOM JSON into a flat list of [`GridCell`].
#[derive(Debug, Clone, Default)]
pub struct SchemaNormalizer {
    config: NormalizerConfig,
}

impl SchemaNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize a parsed document. Never fails; unusable input yields an
    /// empty or partial list.
    pub fn normalize(&self, root: &Value) -> Vec<GridCell> {
        let Some(candidate) = self.locate(root) else {
            warn!(root = kind(root), "no cell list found in SOM document");
            return Vec::new();
        };

        let found = candidate.items.len();
        let cells: Vec<GridCell> = candidate.items.into_iter().filter_map(decode_cell).collect();

        debug!(
            shape = ?candidate.shape,
            candidates = found,
            cells = cells.len(),
            "normalized SOM document"
        );

        cells
    }

    /// Find the candidate cell list, trying each shape in priority order.
    pub fn locate<'a>(&self, root: &'a Value) -> Option<Candidate<'a>> {
        match root {
            Value::Array(items) => Some(Candidate {
                shape: CandidateShape::FlatArray,
                items: items.iter().collect(),
            }),
            Value::Object(object) => match index_object_values(object) {
                Some(items) => Some(Candidate {
                    shape: CandidateShape::IndexObject,
                    items,
                }),
                None => self.search(object, 0),
            },
            _ => None,
        }
    }

    /// Depth-first search through nested properties.
    ///
    /// At each object, direct properties holding an array of objects win
    /// over anything deeper; otherwise each property is searched in document
    /// order.
    fn search<'a>(&self, object: &'a Map<String, Value>, depth: usize) -> Option<Candidate<'a>> {
        if depth > self.config.max_depth {
            return None;
        }

        if depth > 0 {
            if let Some(items) = index_object_values(object) {
                return Some(Candidate {
                    shape: CandidateShape::Nested { depth },
                    items,
                });
            }
        }

        for value in object.values() {
            if let Value::Array(items) = value {
                if holds_objects(items) {
                    return Some(Candidate {
                        shape: CandidateShape::Nested { depth: depth + 1 },
                        items: items.iter().collect(),
                    });
                }
            }
        }

        object
            .values()
            .filter_map(Value::as_object)
            .find_map(|child| self.search(child, depth + 1))
    }
}

/// Normalize with the default configuration.
pub fn normalize_som_document(root: &Value) -> Vec<GridCell> {
    SchemaNormalizer::default().normalize(root)
}

/// Values of an object whose keys are all non-negative integers, ordered by
/// numeric key. `None` for any other object, including an empty one.
fn index_object_values(object: &Map<String, Value>) -> Option<Vec<&Value>> {
    if object.is_empty() {
        return None;
    }

    let mut indexed = Vec::with_capacity(object.len());
    for (key, value) in object {
        if !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: u64 = key.parse().ok()?;
        indexed.push((index, value));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Some(indexed.into_iter().map(|(_, value)| value).collect())
}

/// Whether the first non-null element is an object.
fn holds_objects(items: &[Value]) -> bool {
    items
        .iter()
        .find(|v| !v.is_null())
        .is_some_and(Value::is_object)
}

/// Decode one raw cell, or `None` if it carries no usable signal.
fn decode_cell(raw: &Value) -> Option<GridCell> {
    let object = raw.as_object()?;

    let cell = GridCell {
        row: finite_or(first_present(object, ROW_ALIASES), 0.0),
        col: finite_or(first_present(object, COL_ALIASES), 0.0),
        proportions: distribution(object.get("proportions")),
        counts: distribution(object.get("counts")),
    };

    cell.is_usable().then_some(cell)
}

/// Read a label → number object; anything that isn't an object is empty.
/// Non-numeric values count as 0.
fn distribution(value: Option<&Value>) -> LabelMap<f64> {
    match value {
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(label, v)| (label.clone(), finite_or(Some(v), 0.0)))
            .collect(),
        _ => LabelMap::new(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Output of the `normalize_som_json` entry point.
#[derive(Debug, Serialize)]
pub struct NormalizeOutput {
    pub cells: Vec<GridCell>,
    pub total: usize,
}

/// JSON entry point: parse a raw SOM document, normalize, serialize cells.
/// Used by both the raw-ABI and browser WASM targets.
pub fn normalize_som_json(input: &str) -> String {
    let root: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid SOM document: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let cells = normalize_som_document(&root);
    let total = cells.len();

    match serde_json::to_string(&NormalizeOutput { cells, total }) {
        Ok(json) => json,
        Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn props(entries: &[(&str, f64)]) -> LabelMap<f64> {
        entries.iter().map(|(l, v)| (l.to_string(), *v)).collect()
    }

    #[test]
    fn nested_cells_property() {
        let doc = json!({"cells": [{"row": 0, "col": 0, "proportions": {"M": 1}}]});
        let cells = normalize_som_document(&doc);

        assert_eq!(cells, vec![GridCell::new(0.0, 0.0, props(&[("M", 1.0)]))]);
        assert!(cells[0].counts.is_empty());
    }

    #[test]
    fn bad_row_defaults_to_zero() {
        let doc = json!([{"row": "abc", "col": 3, "proportions": {"A": 0.7, "B": 0.3}}]);
        let cells = normalize_som_document(&doc);

        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].row, 0.0);
        assert_eq!(cells[0].col, 3.0);
    }

    #[test]
    fn flat_array_keeps_order_and_values() {
        let doc = json!([
            {"row": 2, "col": 1, "proportions": {"A": 0.25}, "counts": {"A": 5}},
            {"row": 0, "col": 4, "proportions": {"B": 1.0}, "counts": {"B": 9}},
            {"row": 1, "col": 0, "proportions": {"C": 0.5, "A": 0.5}, "counts": {"C": 2, "A": 2}}
        ]);
        assert_eq!(cell_coords(&doc), vec![(2.0, 1.0), (0.0, 4.0), (1.0, 0.0)]);

        let cells = normalize_som_document(&doc);
        assert_eq!(cells[2].proportions, props(&[("C", 0.5), ("A", 0.5)]));
        assert_eq!(cells[0].counts, props(&[("A", 5.0)]));
    }

    fn cell_coords(doc: &Value) -> Vec<(f64, f64)> {
        normalize_som_document(doc)
            .iter()
            .map(|c| (c.row, c.col))
            .collect()
    }

    #[test]
    fn index_object_sorted_numerically() {
        let doc = json!({
            "10": {"row": 10, "col": 0, "proportions": {"A": 1}},
            "2": {"row": 2, "col": 0, "proportions": {"A": 1}},
            "0": {"row": 0, "col": 0, "proportions": {"A": 1}}
        });
        let rows: Vec<f64> = normalize_som_document(&doc).iter().map(|c| c.row).collect();
        assert_eq!(rows, vec![0.0, 2.0, 10.0]);

        let normalizer = SchemaNormalizer::default();
        assert_eq!(
            normalizer.locate(&doc).map(|c| c.shape),
            Some(CandidateShape::IndexObject)
        );
    }

    #[test]
    fn field_aliases() {
        let doc = json!([
            {"r": 1, "c": 2, "proportions": {"A": 1}},
            {"i": 3, "j": 4, "proportions": {"A": 1}},
            {"y": 5, "x": 6, "proportions": {"A": 1}},
            {"row": "7", "column": "8", "proportions": {"A": 1}}
        ]);
        assert_eq!(
            cell_coords(&doc),
            vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0), (7.0, 8.0)]
        );
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let doc = json!([{"row": 1, "y": 9, "col": 2, "x": 8, "proportions": {"A": 1}}]);
        let cell = &normalize_som_document(&doc)[0];
        assert_eq!((cell.row, cell.col), (1.0, 2.0));
    }

    #[test]
    fn drops_cells_without_distribution() {
        let doc = json!([
            {"row": 0, "col": 0},
            {"row": 0, "col": 1, "proportions": {}},
            {"row": 0, "col": 2, "proportions": "A"},
            {"row": 0, "col": 3, "counts": {"A": 4}},
            42,
            null
        ]);
        let cells = normalize_som_document(&doc);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].col, 3.0);
        assert!(cells[0].proportions.is_empty());
    }

    #[test]
    fn deep_search_finds_nested_array() {
        let doc = json!({
            "meta": {"title": "SOM-APT30", "shape": [10, 10]},
            "payload": {"som": {"grid": {"cells": [
                {"row": 1, "col": 1, "proportions": {"APT30": 0.9}}
            ]}}}
        });
        let normalizer = SchemaNormalizer::default();
        let candidate = normalizer.locate(&doc).unwrap();
        assert_eq!(candidate.shape, CandidateShape::Nested { depth: 4 });
        assert_eq!(normalizer.normalize(&doc).len(), 1);
    }

    #[test]
    fn direct_property_wins_over_deeper_match() {
        let doc = json!({
            "wrapper": {"cells": [{"row": 9, "col": 9, "proportions": {"DEEP": 1}}]},
            "cells": [{"row": 1, "col": 1, "proportions": {"SHALLOW": 1}}]
        });
        let cells = normalize_som_document(&doc);
        assert!(cells[0].proportions.contains("SHALLOW"));
    }

    #[test]
    fn scalar_arrays_are_skipped() {
        let doc = json!({
            "shape": [10, 10],
            "data": {"cells": [{"row": 1, "col": 1, "proportions": {"A": 1}}]}
        });
        assert_eq!(normalize_som_document(&doc).len(), 1);
    }

    #[test]
    fn depth_limit_is_respected() {
        let mut doc = json!({"cells": [{"row": 0, "col": 0, "proportions": {"A": 1}}]});
        for _ in 0..3 {
            doc = json!({ "wrap": doc });
        }

        let shallow = SchemaNormalizer::new(NormalizerConfig { max_depth: 2 });
        assert!(shallow.normalize(&doc).is_empty());

        let deep = SchemaNormalizer::new(NormalizerConfig { max_depth: 3 });
        assert_eq!(deep.normalize(&doc).len(), 1);
    }

    #[test]
    fn scalars_and_empty_documents() {
        assert!(normalize_som_document(&json!(null)).is_empty());
        assert!(normalize_som_document(&json!("cells")).is_empty());
        assert!(normalize_som_document(&json!({})).is_empty());
        assert!(normalize_som_document(&json!([])).is_empty());
    }

    #[test]
    fn non_numeric_proportion_values_become_zero() {
        let doc = json!([{"row": 0, "col": 0, "proportions": {"A": "0.4", "B": "n/a"}}]);
        let cell = &normalize_som_document(&doc)[0];
        assert_eq!(cell.proportions, props(&[("A", 0.4), ("B", 0.0)]));
    }

    #[test]
    fn normalize_som_json_roundtrip() {
        let out = normalize_som_json(r#"{"cells":[{"r":1,"c":2,"proportions":{"M":1}}]}"#);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total"], 1);
        assert_eq!(parsed["cells"][0]["row"], 1.0);
        assert_eq!(parsed["cells"][0]["col"], 2.0);
        assert_eq!(parsed["cells"][0]["counts"], json!({}));
    }

    #[test]
    fn normalize_som_json_invalid_input() {
        let out = normalize_som_json("{not json");
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["error"]
            .as_str()
            .unwrap()
            .contains("invalid SOM document"));
    }
}
