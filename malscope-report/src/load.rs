//! Concurrent loading of reference documents from disk.
//!
//! Each document is read as text and then parsed, so a parse failure can
//! name the file and quote its start. The first failure fails the whole
//! load; partial reference sets are never handed to the core.

use std::path::{Path, PathBuf};

use malscope_core::{parse_document, LoadError, LoadResult};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info};

use malscope::tracing::prefix;

/// Raw documents for one report.
#[derive(Debug)]
pub struct Documents {
    pub labels: Value,
    pub points: Value,
    pub soms: Vec<Value>,
    /// `Null` when no evaluation document was given
    pub samples: Value,
}

/// Read and parse one document.
pub async fn load_document(path: &Path) -> LoadResult<Value> {
    let name = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::transport(name.as_str(), e))?;

    let value = parse_document(&name, &text)?;
    debug!("{} loaded {} ({} bytes)", prefix::LOAD, name, text.len());
    Ok(value)
}

/// Load every SOM document concurrently, keeping argument order.
async fn load_soms(paths: &[PathBuf]) -> LoadResult<Vec<Value>> {
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        tasks.spawn(async move { (index, load_document(&path).await) });
    }

    let mut slots: Vec<Option<Value>> = vec![None; paths.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, loaded) = joined.map_err(|e| LoadError::transport("som", e))?;
        slots[index] = Some(loaded?);
    }

    Ok(slots.into_iter().flatten().collect())
}

async fn load_optional(path: Option<&Path>) -> LoadResult<Value> {
    match path {
        Some(path) => load_document(path).await,
        None => Ok(Value::Null),
    }
}

/// Paths of every document a report reads.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub labels: &'a Path,
    pub points: &'a Path,
    pub soms: &'a [PathBuf],
    pub samples: Option<&'a Path>,
}

/// Load the catalog, the points, all SOM documents and the evaluation rows
/// at once.
pub async fn load_all(sources: Sources<'_>) -> LoadResult<Documents> {
    let (labels, points, soms, samples) = tokio::join!(
        load_document(sources.labels),
        load_document(sources.points),
        load_soms(sources.soms),
        load_optional(sources.samples),
    );

    let documents = Documents {
        labels: labels?,
        points: points?,
        soms: soms?,
        samples: samples?,
    };
    info!(
        "{} loaded references: {} SOM document(s)",
        prefix::LOAD,
        documents.soms.len()
    );
    Ok(documents)
}
