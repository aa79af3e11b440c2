use crate::types::DEFAULT_BIN_SIZE;
use clap::{Parser, Subcommand};
use noodles::core::Region;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "vcfidx")]
#[command(about = "Bin index for sorted VCF-like text files")]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build `<path>.idx` for a source sorted by chromosome and position
    Build {
        path: PathBuf,

        /// Width of each bin in positions
        #[arg(short, long, env = "VCFIDX_BIN_SIZE", default_value_t = DEFAULT_BIN_SIZE)]
        bin_size: u32,
    },

    /// Print line count and offset of the records in a region (e.g. chr1:100-200)
    Query { path: PathBuf, region: Region },

    /// Print the records in a region
    Fetch { path: PathBuf, region: Region },

    /// Describe the index of a source file
    Info { path: PathBuf },
}

/// Chromosome and inclusive position bounds of a region.
///
/// A missing start or end leaves that side unbounded.
pub fn region_bounds(region: &Region) -> (String, u64, u64) {
    let name: &[u8] = region.name().as_ref();
    let interval = region.interval();
    let start = interval.start().map(|p| usize::from(p) as u64).unwrap_or(0);
    let end = interval
        .end()
        .map(|p| usize::from(p) as u64)
        .unwrap_or(u64::MAX);
    (String::from_utf8_lossy(name).into_owned(), start, end)
}
