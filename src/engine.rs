//! Build, load, search and release, plus a [`VariantIndex`] bound to one file.

use crate::error;
use crate::index::{self, IndexHandle, codec};
use crate::source;
use crate::types::{IndexSummary, QueryResult};
use crate::{Result, query};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Index a sorted source and write `<path>.idx`, replacing any previous index.
pub fn build(path: &Path, bin_size: u32) -> Result<IndexSummary> {
    let started = Instant::now();
    info!("building index for {} (bin size {})", path.display(), bin_size);

    let mut scanner = source::scan(path)?;
    let built = index::build_from(&mut scanner, bin_size)?;
    info!(
        "scanned {} chromosomes in {:.2?}",
        built.chromosomes().len(),
        started.elapsed()
    );

    let started = Instant::now();
    let target = index::index_path(path);
    codec::write(&target, &built)?;
    info!("saved {} in {:.2?}", target.display(), started.elapsed());

    Ok(IndexHandle::new(built).summary())
}

/// Load the companion index of `path`.
pub fn load(path: &Path) -> Result<IndexHandle> {
    let started = Instant::now();
    let target = index::index_path(path);
    let handle = IndexHandle::new(codec::read(&target)?);
    info!("loaded {} in {:.2?}", target.display(), started.elapsed());
    Ok(handle)
}

/// Range query against `path` using a handle loaded from its index.
pub fn search(
    path: &Path,
    handle: &IndexHandle,
    chromosome: &str,
    start: u64,
    end: u64,
) -> Result<QueryResult> {
    query::search(handle, path, chromosome, start, end)
}

/// Raw lines of the records a query matched, plus any comment or blank
/// lines lying between them.
pub fn fetch(path: &Path, result: &QueryResult) -> Result<Bytes> {
    source::read_records(path, result)
}

/// Free a loaded index. The handle cannot be used afterwards.
pub fn release(handle: IndexHandle) {
    debug!(
        "releasing index with {} chromosomes",
        handle.index().chromosomes().len()
    );
    drop(handle);
}

/// A loaded index together with the source file it answers for.
#[derive(Debug)]
pub struct VariantIndex {
    source: PathBuf,
    handle: IndexHandle,
}

impl VariantIndex {
    /// Load the existing index of `source`.
    pub fn open(source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let handle = load(&source)?;

        let actual = error::open(&source)?.metadata()?.len();
        if actual != handle.source_len() {
            warn!(
                "{} is {} bytes but was indexed at {} bytes; results may be wrong",
                source.display(),
                actual,
                handle.source_len()
            );
        }

        Ok(Self { source, handle })
    }

    /// Build (or rebuild) the index of `source`, then load it.
    pub fn build(source: impl Into<PathBuf>, bin_size: u32) -> Result<Self> {
        let source = source.into();
        build(&source, bin_size)?;
        Self::open(source)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn handle(&self) -> &IndexHandle {
        &self.handle
    }

    pub fn query(&self, chromosome: &str, start: u64, end: u64) -> Result<QueryResult> {
        search(&self.source, &self.handle, chromosome, start, end)
    }

    pub fn fetch(&self, result: &QueryResult) -> Result<Bytes> {
        fetch(&self.source, result)
    }

    pub fn summary(&self) -> IndexSummary {
        self.handle.summary()
    }

    pub fn release(self) {
        release(self.handle)
    }
}
