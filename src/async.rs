//! Async counterparts of the engine operations.
//!
//! Index I/O is synchronous, so each call runs on tokio's blocking pool.

use crate::index::IndexHandle;
use crate::types::{IndexSummary, QueryResult};
use crate::{Error, Result, engine};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("index task failed: {}", e)))?
}

pub async fn build(path: impl Into<PathBuf>, bin_size: u32) -> Result<IndexSummary> {
    let path = path.into();
    blocking(move || engine::build(&path, bin_size)).await
}

pub async fn load(path: impl Into<PathBuf>) -> Result<IndexHandle> {
    let path = path.into();
    blocking(move || engine::load(&path)).await
}

/// Search with a shared handle; any number of these may run at once.
pub async fn search(
    path: impl Into<PathBuf>,
    handle: Arc<IndexHandle>,
    chromosome: impl Into<String>,
    start: u64,
    end: u64,
) -> Result<QueryResult> {
    let path = path.into();
    let chromosome = chromosome.into();
    blocking(move || engine::search(&path, &handle, &chromosome, start, end)).await
}

pub async fn fetch(path: impl Into<PathBuf>, result: QueryResult) -> Result<Bytes> {
    let path = path.into();
    blocking(move || engine::fetch(&path, &result)).await
}
