//! Bin tables and the companion index file.
//!
//! An [`Index`] groups the records of a sorted source into fixed-width bins
//! per chromosome. Each [`Bin`] remembers where its first record starts and
//! how many records follow it contiguously, so a query only re-reads the
//! source at the two boundary bins of its range.
//!
//! # Layout
//!
//! The index lives beside its source as `<source>.idx`; see [`codec`] for the
//! byte layout. An index is only meaningful for the exact file it was built
//! from.

mod builder;
pub mod codec;

pub use builder::{BinTableBuilder, build_from};

use crate::types::{ChromosomeSummary, IndexSummary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Suffix appended to the source path to locate its index.
pub const INDEX_SUFFIX: &str = ".idx";

/// Companion index path for a source file.
pub fn index_path(source: &Path) -> PathBuf {
    let mut path = source.as_os_str().to_owned();
    path.push(INDEX_SUFFIX);
    PathBuf::from(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bin {
    /// `position / bin_size` shared by every record in the bin
    pub bin_index: u32,
    pub count: u32,
    pub first_offset: u64,
}

impl Bin {
    fn open(bin_index: u32, first_offset: u64) -> Self {
        Self {
            bin_index,
            count: 1,
            first_offset,
        }
    }
}

/// Bins of one chromosome, ordered by `bin_index`. Empty bins are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeEntry {
    pub name: String,
    pub bins: Vec<Bin>,
}

impl ChromosomeEntry {
    pub fn records(&self) -> u64 {
        self.bins.iter().map(|b| u64::from(b.count)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    bin_size: u32,
    source_len: u64,
    chromosomes: Vec<ChromosomeEntry>,
}

impl Index {
    pub fn new(bin_size: u32, source_len: u64, chromosomes: Vec<ChromosomeEntry>) -> Self {
        Self {
            bin_size,
            source_len,
            chromosomes,
        }
    }

    pub fn bin_size(&self) -> u32 {
        self.bin_size
    }

    /// Byte length of the source the index was built from
    pub fn source_len(&self) -> u64 {
        self.source_len
    }

    /// Chromosomes in the order they first appear in the source.
    pub fn chromosomes(&self) -> &[ChromosomeEntry] {
        &self.chromosomes
    }
}

/// A loaded, immutable index ready for queries.
///
/// Holds no file handles or cursors, so it can be shared between threads and
/// searched concurrently. Dropping it (or passing it to
/// [`release`](crate::release)) frees everything it owns.
#[derive(Debug)]
pub struct IndexHandle {
    index: Index,
    by_name: HashMap<String, usize>,
    // cumulative[i][k] = records in bins[..k] of chromosome i
    cumulative: Vec<Vec<u64>>,
}

impl IndexHandle {
    pub fn new(index: Index) -> Self {
        let by_name = index
            .chromosomes
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        let cumulative = index
            .chromosomes
            .iter()
            .map(|entry| {
                let mut sums = Vec::with_capacity(entry.bins.len() + 1);
                let mut total = 0u64;
                sums.push(total);
                for bin in &entry.bins {
                    total += u64::from(bin.count);
                    sums.push(total);
                }
                sums
            })
            .collect();

        Self {
            index,
            by_name,
            cumulative,
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn bin_size(&self) -> u32 {
        self.index.bin_size
    }

    pub fn source_len(&self) -> u64 {
        self.index.source_len
    }

    /// Chromosome entry together with its prefix sums of bin counts.
    pub(crate) fn chromosome(&self, name: &str) -> Option<(&ChromosomeEntry, &[u64])> {
        let i = *self.by_name.get(name)?;
        Some((&self.index.chromosomes[i], &self.cumulative[i]))
    }

    pub fn summary(&self) -> IndexSummary {
        let chromosomes = self
            .index
            .chromosomes
            .iter()
            .zip(&self.cumulative)
            .map(|(entry, sums)| ChromosomeSummary {
                name: entry.name.clone(),
                bins: entry.bins.len(),
                records: sums.last().copied().unwrap_or(0),
                first_offset: entry.bins.first().map(|b| b.first_offset).unwrap_or(0),
            })
            .collect();

        IndexSummary {
            version: codec::FORMAT_VERSION,
            bin_size: self.index.bin_size,
            source_len: self.index.source_len,
            chromosomes,
        }
    }
}
