//! k-Nearest-Neighbor Label Inference
//!
//! Places a synthetic query point onto a loaded reference set and predicts
//! its label:
//!
//! - **Grid mode**: SOM cells, distance-weighted vote over each neighbor's
//!   label proportions (default k = 5)
//! - **Point mode**: t-SNE points, one vote per neighbor (default k = 7)
//!
//! Both share the same neighbor search ([`k_nearest`]) and differ only in
//! the [`Aggregator`] that folds neighbors into a tally.
//!
//! # Example
//!
//! ```rust
//! use malscope_core::embedding::EmbeddedPoint;
//! use malscope_core::knn::{classify_against_points, QueryPoint};
//!
//! let points = vec![
//!     EmbeddedPoint::new(0.0, 0.0, "X"),
//!     EmbeddedPoint::new(10.0, 10.0, "Y"),
//! ];
//! let prediction = classify_against_points(QueryPoint::new(1.0, 1.0), &points, Some(1));
//! assert_eq!(prediction.label, "X");
//! ```

pub mod classifier;
pub mod neighbors;

pub use classifier::{
    classify_against_grid, classify_against_points, classify_json, ClassifierConfig,
    ClassifyInput, Mode, NeighborClassifier, Prediction, Reference, Tally, DEFAULT_EPSILON,
    DEFAULT_GRID_K, DEFAULT_POINT_K,
};
pub use neighbors::{
    aggregate_nearest, k_nearest, Aggregator, Located, MajorityVote, Neighbor, QueryPoint,
    WeightedProportions, UNKNOWN_LABEL,
};
