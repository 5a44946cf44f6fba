//! Self-Organizing Map grids
//!
//! SOM documents are normalized into flat [`GridCell`] lists, which the
//! grid-mode classifier and the display summaries consume.
//!
//! # Example
//!
//! ```rust
//! use malscope_core::som::normalize_som_document;
//! use serde_json::json;
//!
//! let doc = json!({"cells": [{"row": 0, "col": 0, "proportions": {"M": 1}}]});
//! let cells = normalize_som_document(&doc);
//! assert_eq!(cells.len(), 1);
//! assert!(cells[0].counts.is_empty());
//! ```

pub mod normalize;
pub mod summary;
mod types;

pub use normalize::{
    normalize_som_document, normalize_som_json, Candidate, CandidateShape, NormalizeOutput,
    NormalizerConfig, SchemaNormalizer, DEFAULT_MAX_DEPTH,
};
pub use summary::{
    collect_labels, extract_title, hover_text, pie_slices, GridExtent, PieSlice, OTHER_SLICE,
    TITLE_SEARCH_DEPTH,
};
pub use types::GridCell;
