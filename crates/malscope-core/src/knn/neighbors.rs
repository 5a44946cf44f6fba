//! Shared "k-nearest, then aggregate" routine.
//!
//! Both classifiers rank reference items by Euclidean distance to the query
//! and keep the closest `k`; they differ only in how the kept neighbors are
//! folded into per-label tallies. That fold is the [`Aggregator`].

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddedPoint;
use crate::label_map::LabelMap;
use crate::som::GridCell;

/// Label assigned to neighbors that carry no label of their own.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// An ephemeral query position. Lives for one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub x: f64,
    pub y: f64,
}

impl QueryPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, (x, y): (f64, f64)) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// A reference item's position in the query plane.
pub trait Located {
    fn position(&self) -> (f64, f64);
}

impl Located for GridCell {
    /// Columns run along x, rows along y.
    fn position(&self) -> (f64, f64) {
        (self.col, self.row)
    }
}

impl Located for EmbeddedPoint {
    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// A reference item and its distance from the query.
#[derive(Debug)]
pub struct Neighbor<'a, T> {
    pub item: &'a T,
    pub distance: f64,
}

/// The `k` items closest to `query`, nearest first.
///
/// The sort is stable, so equidistant items keep their reference order.
/// `k` is clamped to `1..=items.len()`.
pub fn k_nearest<T: Located>(query: QueryPoint, items: &[T], k: usize) -> Vec<Neighbor<'_, T>> {
    let mut ranked: Vec<Neighbor<'_, T>> = items
        .iter()
        .map(|item| Neighbor {
            item,
            distance: query.distance_to(item.position()),
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked.truncate(k.max(1));
    ranked
}

/// Folds the selected neighbors into a per-label tally.
pub trait Aggregator<T> {
    type Value: Copy + PartialOrd;

    fn add(&mut self, item: &T, distance: f64);

    fn finish(self) -> LabelMap<Self::Value>;
}

/// Run `aggregator` over the `k` nearest items.
pub fn aggregate_nearest<T, A>(
    query: QueryPoint,
    items: &[T],
    k: usize,
    mut aggregator: A,
) -> LabelMap<A::Value>
where
    T: Located,
    A: Aggregator<T>,
{
    for neighbor in k_nearest(query, items, k) {
        aggregator.add(neighbor.item, neighbor.distance);
    }
    aggregator.finish()
}

/// Distance-weighted sum of cell proportions: each neighbor contributes
/// `proportion / (distance + epsilon)` to each of its labels.
#[derive(Debug, Clone)]
pub struct WeightedProportions {
    epsilon: f64,
    scores: LabelMap<f64>,
}

impl WeightedProportions {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            scores: LabelMap::new(),
        }
    }
}

impl Aggregator<GridCell> for WeightedProportions {
    type Value = f64;

    fn add(&mut self, cell: &GridCell, distance: f64) {
        let weight = 1.0 / (distance + self.epsilon);
        for (label, proportion) in cell.proportions.iter() {
            *self.scores.entry_or_insert_with(label, || 0.0) += weight * proportion;
        }
    }

    fn finish(self) -> LabelMap<f64> {
        self.scores
    }
}

/// One unweighted vote per neighbor for its own label.
#[derive(Debug, Clone, Default)]
pub struct MajorityVote {
    votes: LabelMap<usize>,
}

impl MajorityVote {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregator<EmbeddedPoint> for MajorityVote {
    type Value = usize;

    fn add(&mut self, point: &EmbeddedPoint, _distance: f64) {
        let label = if point.label.is_empty() {
            UNKNOWN_LABEL
        } else {
            point.label.as_str()
        };
        *self.votes.entry_or_insert_with(label, || 0) += 1;
    }

    fn finish(self) -> LabelMap<usize> {
        self.votes
    }
}
