//! malscope Core Engine
//!
//! Analysis kernel behind the malware report page, designed to run
//! identically in the browser (WASM) and in native tools.
//!
//! - [`som`] - normalize arbitrarily-shaped SOM documents into grid cells
//! - [`knn`] - k-nearest-neighbor label inference over grids or point clouds
//! - [`embedding`] - t-SNE points and per-sample evaluation records
//! - [`palette`] - stable label → color mapping shared by all charts
//! - [`report`] - load everything once, roll query points, summarize
//!
//! # Features
//!
//! - `std` - Standard library (default)
//! - `wasm` - WASM-compatible build
//!
//! # Example
//!
//! ```rust
//! use malscope_core::knn::{NeighborClassifier, QueryPoint};
//! use malscope_core::normalize_som_document;
//! use serde_json::json;
//!
//! let doc = json!({
//!     "som": {"grid": [
//!         {"r": 0, "c": 0, "proportions": {"APT30": 0.9, "GOODWARE": 0.1}},
//!         {"r": 3, "c": 3, "proportions": {"GOODWARE": 1.0}}
//!     ]}
//! });
//! let cells = normalize_som_document(&doc);
//!
//! let classifier = NeighborClassifier::default();
//! let prediction = classifier.classify_against_grid(QueryPoint::new(0.2, 0.1), &cells, Some(1));
//! assert_eq!(prediction.label, "APT30");
//! ```

pub mod coerce;
pub mod embedding;
pub mod error;
pub mod knn;
pub mod label_map;
pub mod labels;
pub mod palette;
pub mod query;
pub mod report;
pub mod som;

// Re-export main types at crate root
pub use embedding::{
    class_counts, filter_by_period, parse_points, parse_samples, uncertain_samples, Bounds,
    EmbeddedPoint, PeriodRange, SampleRecord,
};
pub use error::{parse_document, LoadError, LoadResult};
pub use knn::{
    classify_against_grid, classify_against_points, classify_json, ClassifierConfig, Mode,
    NeighborClassifier, Prediction, QueryPoint, Reference, Tally, UNKNOWN_LABEL,
};
pub use label_map::LabelMap;
pub use labels::{merge_labels, parse_label_catalog};
pub use palette::{label_colors_json, ColorAssigner};
pub use query::{grid_query, scatter_query};
pub use report::{
    build_report, build_report_json, evaluate, summarize, Evaluation, FamilyScore,
    LoadedReferences, Report, ReportInputs, ReportSummary,
};
pub use som::{
    normalize_som_document, normalize_som_json, GridCell, GridExtent, NormalizerConfig,
    SchemaNormalizer,
};
