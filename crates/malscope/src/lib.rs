//! # malscope Shared Rust Library
//!
//! Shared infrastructure for the native malscope tools:
//! - **error**: Common error type wrapping IO, JSON and document load failures
//! - **tracing**: Logging setup with malscope segment prefixes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use malscope::error::{Error, Result};
//! use malscope::tracing::{init_with_filter, prefix};
//! ```

pub mod error;
pub mod tracing;

// Re-export commonly used items at crate root
pub use error::{Error, Result};
