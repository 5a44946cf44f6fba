//! Logging utilities with malscope segment prefixes.
//!
//! Provides consistent logging setup across malscope native tools.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with malscope defaults.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format written to stderr, leaving stdout for reports
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with a custom default filter.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// malscope segment prefixes for logging.
pub mod prefix {
    /// Reference document loading
    pub const LOAD: &str = "⇣";
    /// SOM grid operations
    pub const SOM: &str = "▦";
    /// Label inference
    pub const KNN: &str = "◎";
}
