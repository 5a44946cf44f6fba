//! Grid cell types

use serde::{Deserialize, Serialize};

use crate::label_map::LabelMap;

/// One cell of a self-organizing map.
///
/// `row`/`col` are grid coordinates; they are whole numbers in practice but
/// kept as `f64` so that query points and cells share one coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: f64,
    pub col: f64,
    /// Label → fraction of the cell's samples. Not guaranteed to sum to 1.
    #[serde(default)]
    pub proportions: LabelMap<f64>,
    /// Label → raw sample count. Display only.
    #[serde(default)]
    pub counts: LabelMap<f64>,
}

impl GridCell {
    pub fn new(row: f64, col: f64, proportions: LabelMap<f64>) -> Self {
        Self {
            row,
            col,
            proportions,
            counts: LabelMap::new(),
        }
    }

    /// Finite coordinates and at least one non-empty distribution.
    pub fn is_usable(&self) -> bool {
        self.row.is_finite()
            && self.col.is_finite()
            && (!self.proportions.is_empty() || !self.counts.is_empty())
    }
}
