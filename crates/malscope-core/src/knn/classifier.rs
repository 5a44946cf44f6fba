//! Neighbor classifier
//!
//! Predicts a label for a query point against a SOM grid (distance-weighted
//! proportion vote) or a t-SNE point cloud (plain majority vote).
//!
//! Both modes are pure: no hidden state, no mutation of the reference set,
//! the same inputs always give the same prediction. Ties go to the label
//! first encountered while walking the neighbors nearest-first (and, within
//! a cell, in proportion order).

use serde::{Deserialize, Serialize};

use super::neighbors::{
    aggregate_nearest, MajorityVote, QueryPoint, WeightedProportions, UNKNOWN_LABEL,
};
use crate::embedding::EmbeddedPoint;
use crate::label_map::LabelMap;
use crate::som::{normalize_som_document, GridCell};

/// Neighbors consulted in grid mode.
pub const DEFAULT_GRID_K: usize = 5;

/// Neighbors consulted in point mode.
pub const DEFAULT_POINT_K: usize = 7;

/// Added to distances before inverting, so a query on a cell stays finite.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Classifier configuration. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Neighbor count for grid mode (default: 5)
    pub grid_k: usize,
    /// Neighbor count for point mode (default: 7)
    pub point_k: usize,
    /// Distance offset for inverse-distance weights (default: 1e-6)
    pub epsilon: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            grid_k: DEFAULT_GRID_K,
            point_k: DEFAULT_POINT_K,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Which reference representation to classify against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Grid,
    Points,
}

/// A loaded reference set
#[derive(Debug, Clone, Copy)]
pub enum Reference<'a> {
    Grid(&'a [GridCell]),
    Points(&'a [EmbeddedPoint]),
}

impl Reference<'_> {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Grid(_) => Mode::Grid,
            Self::Points(_) => Mode::Points,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Grid(cells) => cells.is_empty(),
            Self::Points(points) => points.is_empty(),
        }
    }
}

/// Per-label evidence behind a prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tally {
    /// Grid mode: accumulated weighted proportions
    Scores(LabelMap<f64>),
    /// Point mode: neighbor votes
    Votes(LabelMap<usize>),
}

/// A predicted label and the tally it was chosen from.
///
/// Serializes as `{"label":..,"scores":{..}}` or `{"label":..,"votes":{..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    #[serde(flatten)]
    pub tally: Tally,
}

impl Prediction {
    fn from_scores(scores: LabelMap<f64>) -> Self {
        Self {
            label: winner(&scores),
            tally: Tally::Scores(scores),
        }
    }

    fn from_votes(votes: LabelMap<usize>) -> Self {
        Self {
            label: winner(&votes),
            tally: Tally::Votes(votes),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

fn winner<V: Copy + PartialOrd>(tally: &LabelMap<V>) -> String {
    tally
        .argmax()
        .map(|(label, _)| label.to_string())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// k-NN classifier over either reference representation
#[derive(Debug, Clone, Default)]
pub struct NeighborClassifier {
    config: ClassifierConfig,
}

impl NeighborClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Distance-weighted proportion vote over the `k` nearest cells.
    ///
    /// An empty grid predicts `"UNKNOWN"` with no scores. So does a
    /// neighborhood whose cells carry counts but no proportions.
    pub fn classify_against_grid(
        &self,
        query: QueryPoint,
        cells: &[GridCell],
        k: Option<usize>,
    ) -> Prediction {
        let k = k.unwrap_or(self.config.grid_k);
        let scores = aggregate_nearest(
            query,
            cells,
            k,
            WeightedProportions::new(self.config.epsilon),
        );
        Prediction::from_scores(scores)
    }

    /// Majority vote over the `k` nearest points.
    ///
    /// An empty point cloud predicts `"UNKNOWN"` with no votes.
    pub fn classify_against_points(
        &self,
        query: QueryPoint,
        points: &[EmbeddedPoint],
        k: Option<usize>,
    ) -> Prediction {
        let k = k.unwrap_or(self.config.point_k);
        let votes = aggregate_nearest(query, points, k, MajorityVote::new());
        Prediction::from_votes(votes)
    }

    /// Dispatch on the reference representation.
    pub fn classify(
        &self,
        query: QueryPoint,
        reference: Reference<'_>,
        k: Option<usize>,
    ) -> Prediction {
        match reference {
            Reference::Grid(cells) => self.classify_against_grid(query, cells, k),
            Reference::Points(points) => self.classify_against_points(query, points, k),
        }
    }
}

/// Grid-mode prediction with default configuration.
pub fn classify_against_grid(
    query: QueryPoint,
    cells: &[GridCell],
    k: Option<usize>,
) -> Prediction {
    NeighborClassifier::default().classify_against_grid(query, cells, k)
}

/// Point-mode prediction with default configuration.
pub fn classify_against_points(
    query: QueryPoint,
    points: &[EmbeddedPoint],
    k: Option<usize>,
) -> Prediction {
    NeighborClassifier::default().classify_against_points(query, points, k)
}

/// Input for the classify_json entry point
#[derive(Debug, Deserialize)]
pub struct ClassifyInput {
    pub query: QueryPoint,
    pub mode: Mode,
    /// Grid mode: any SOM document shape; normalized before classifying
    #[serde(default)]
    pub cells: serde_json::Value,
    /// Point mode: decoded reference points
    #[serde(default)]
    pub points: Vec<EmbeddedPoint>,
    pub k: Option<usize>,
    #[serde(default)]
    pub config: ClassifierConfig,
}

/// Top-level function: classify a query from JSON input, return JSON output.
/// This is the function exposed through WASM.
pub fn classify_json(input: &str) -> String {
    let parsed: ClassifyInput = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid classify input: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let classifier = NeighborClassifier::new(parsed.config);
    let prediction = match parsed.mode {
        Mode::Grid => {
            let cells = normalize_som_document(&parsed.cells);
            classifier.classify_against_grid(parsed.query, &cells, parsed.k)
        }
        Mode::Points => classifier.classify_against_points(parsed.query, &parsed.points, parsed.k),
    };

    match serde_json::to_string(&prediction) {
        Ok(json) => json,
        Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
    }
}
