//! Load errors at the fetch boundary.
//!
//! Transport and parse failures happen before the core sees any data. They
//! are reported to the presentation layer as a single load-error string; the
//! normalizer and classifiers never produce them.

use serde_json::Value;
use thiserror::Error;

/// Leading characters of an unparseable body kept for diagnostics.
const SNIPPET_LEN: usize = 200;

/// Errors that can occur while acquiring a raw document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Network or filesystem failure
    #[error("{document} transport error: {message}")]
    Transport { document: String, message: String },

    /// Non-success HTTP status
    #[error("{document} HTTP {status}")]
    Status { document: String, status: u16 },

    /// Body was not valid JSON
    #[error("{document} JSON parse failed: {message}")]
    Parse {
        document: String,
        message: String,
        /// Start of the offending body
        snippet: String,
    },
}

impl LoadError {
    pub fn transport(document: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            document: document.into(),
            message: message.to_string(),
        }
    }

    pub fn document(&self) -> &str {
        match self {
            Self::Transport { document, .. }
            | Self::Status { document, .. }
            | Self::Parse { document, .. } => document,
        }
    }
}

/// Result type for document loading
pub type LoadResult<T> = Result<T, LoadError>;

/// Parse a fetched body. Bodies are read as text first so that a server
/// sending the wrong content type still parses, and a bad body can be
/// quoted in the error.
pub fn parse_document(document: &str, text: &str) -> LoadResult<Value> {
    serde_json::from_str(text).map_err(|e| LoadError::Parse {
        document: document.to_string(),
        message: e.to_string(),
        snippet: text.chars().take(SNIPPET_LEN).collect(),
    })
}
