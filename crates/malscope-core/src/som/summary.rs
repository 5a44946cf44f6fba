//! Display summaries of normalized SOM grids.
//!
//! Grid extents for axis ranges and query sampling, legend label sets,
//! per-cell pie slices and hover text, and document titles.

use serde::Serialize;
use serde_json::Value;

use super::types::GridCell;
use crate::label_map::LabelMap;

/// Label used for the merged remainder of a pie.
pub const OTHER_SLICE: &str = "OTHER";

/// Default depth limit for [`extract_title`].
pub const TITLE_SEARCH_DEPTH: usize = 5;

/// Largest row and column present in a grid. Both are floored at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GridExtent {
    pub max_row: f64,
    pub max_col: f64,
}

impl GridExtent {
    pub fn of(cells: &[GridCell]) -> Self {
        cells.iter().fold(Self::default(), |acc, cell| Self {
            max_row: if cell.row.is_finite() { acc.max_row.max(cell.row) } else { acc.max_row },
            max_col: if cell.col.is_finite() { acc.max_col.max(cell.col) } else { acc.max_col },
        })
    }
}

/// Distinct proportion labels in discovery order.
///
/// Stops scanning after the cell that brings the set to `max` labels, so the
/// result can exceed `max` by the labels of that one cell.
pub fn collect_labels(cells: &[GridCell], max: usize) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for cell in cells {
        for label in cell.proportions.labels() {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
        if labels.len() >= max {
            break;
        }
    }
    labels
}

/// One wedge of a cell's pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    /// Share of the pie, in `(0, 1]`
    pub fraction: f64,
}

/// Top-`k` labels of a distribution as renormalized pie fractions.
///
/// Labels beyond the top `k` are merged into an [`OTHER_SLICE`] wedge when
/// `include_other` is set, and dropped otherwise. Zero-width wedges are
/// omitted. Equal values keep their distribution order.
pub fn pie_slices(proportions: &LabelMap<f64>, k: usize, include_other: bool) -> Vec<PieSlice> {
    let mut ranked: Vec<(&str, f64)> = proportions.iter().map(|(l, v)| (l, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let rest: f64 = ranked.iter().skip(k).map(|(_, v)| v).sum();
    let mut top: Vec<(&str, f64)> = ranked.into_iter().take(k).collect();
    if include_other && proportions.len() > k {
        top.push((OTHER_SLICE, rest));
    }

    let total: f64 = top.iter().map(|(_, v)| v).sum();
    let total = if total == 0.0 { 1.0 } else { total };

    top.into_iter()
        .map(|(label, value)| (label, value / total))
        .filter(|(_, fraction)| *fraction > 0.0)
        .map(|(label, fraction)| PieSlice {
            label: label.to_string(),
            fraction,
        })
        .collect()
}

/// Hover text for a cell: the largest `top_k` proportions, one per line,
/// rounded to `digits` places.
pub fn hover_text(proportions: &LabelMap<f64>, digits: usize, top_k: usize) -> String {
    let mut ranked: Vec<(&str, f64)> = proportions.iter().map(|(l, v)| (l, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_k);

    if ranked.is_empty() {
        return "(no proportions)".to_string();
    }

    ranked
        .iter()
        .map(|(label, value)| format!("{label}: {value:.digits$}"))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// First non-blank `title` string in a document, depth-first, searching
/// objects and arrays no deeper than `max_depth`.
pub fn extract_title(root: &Value, max_depth: usize) -> Option<String> {
    fn walk(node: &Value, depth: usize, max_depth: usize) -> Option<String> {
        if depth > max_depth {
            return None;
        }
        let children: Box<dyn Iterator<Item = &Value>> = match node {
            Value::Object(object) => {
                if let Some(Value::String(title)) = object.get("title") {
                    let title = title.trim();
                    if !title.is_empty() {
                        return Some(title.to_string());
                    }
                }
                Box::new(object.values())
            }
            Value::Array(items) => Box::new(items.iter()),
            _ => return None,
        };
        children
            .filter(|child| child.is_object() || child.is_array())
            .find_map(|child| walk(child, depth + 1, max_depth))
    }

    walk(root, 0, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dist(entries: &[(&str, f64)]) -> LabelMap<f64> {
        entries.iter().map(|(l, v)| (l.to_string(), *v)).collect()
    }

    fn cell(row: f64, col: f64, entries: &[(&str, f64)]) -> GridCell {
        GridCell::new(row, col, dist(entries))
    }

    #[test]
    fn extent_of_grid() {
        let cells = vec![cell(2.0, 7.0, &[("A", 1.0)]), cell(5.0, 1.0, &[("B", 1.0)])];
        assert_eq!(
            GridExtent::of(&cells),
            GridExtent {
                max_row: 5.0,
                max_col: 7.0
            }
        );
        assert_eq!(GridExtent::of(&[]), GridExtent::default());
    }

    #[test]
    fn labels_in_discovery_order() {
        let cells = vec![
            cell(0.0, 0.0, &[("B", 0.5), ("A", 0.5)]),
            cell(0.0, 1.0, &[("A", 1.0), ("C", 0.1)]),
        ];
        assert_eq!(collect_labels(&cells, 20), vec!["B", "A", "C"]);
        assert_eq!(collect_labels(&cells, 2), vec!["B", "A"]);
    }

    #[test]
    fn pie_merges_remainder() {
        let props = dist(&[("A", 0.1), ("B", 0.4), ("C", 0.2), ("D", 0.3)]);
        let slices = pie_slices(&props, 2, true);

        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "D", OTHER_SLICE]);
        assert!((slices[2].fraction - 0.3).abs() < 1e-12);
        let total: f64 = slices.iter().map(|s| s.fraction).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pie_renormalizes_without_other() {
        let props = dist(&[("A", 2.0), ("B", 2.0), ("C", 1.0)]);
        let slices = pie_slices(&props, 2, false);
        assert_eq!(slices.len(), 2);
        assert!((slices[0].fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn pie_skips_zero_wedges() {
        let props = dist(&[("A", 1.0), ("B", 0.0)]);
        let slices = pie_slices(&props, 3, true);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].fraction, 1.0);
    }

    #[test]
    fn hover_text_formatting() {
        let props = dist(&[("A", 0.25), ("B", 0.5), ("C", 0.25)]);
        assert_eq!(hover_text(&props, 3, 2), "B: 0.500<br>A: 0.250");
        assert_eq!(hover_text(&LabelMap::new(), 3, 10), "(no proportions)");
    }

    #[test]
    fn title_found_depth_first() {
        let doc = json!({"meta": {"info": {"title": "  SOM-dropper "}}, "title": ""});
        assert_eq!(
            extract_title(&doc, TITLE_SEARCH_DEPTH),
            Some("SOM-dropper".to_string())
        );
        assert_eq!(extract_title(&doc, 1), None);
        assert_eq!(extract_title(&json!([1, 2]), TITLE_SEARCH_DEPTH), None);
    }
}
