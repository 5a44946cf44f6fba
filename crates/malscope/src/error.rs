//! Common error types for malscope native tools.

use malscope_core::LoadError;
use thiserror::Error;

/// Common error type for malscope operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A reference document could not be fetched or parsed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Whether this failure happened while loading reference documents.
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}

/// Result type alias using malscope Error.
pub type Result<T> = std::result::Result<T, Error>;
