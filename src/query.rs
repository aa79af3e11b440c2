//! Range queries against a loaded index.
//!
//! The bin array gives record counts at bin granularity only. Bins strictly
//! inside the queried range are counted from prefix sums; the (at most two)
//! bins holding `start` or `end` are re-read from the source to drop records
//! outside the range and to find the exact offset of the first match.

use crate::index::{Bin, IndexHandle};
use crate::source::{self, OffsetScanner};
use crate::types::QueryResult;
use crate::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Count the records of `chromosome` with `start <= position <= end`.
///
/// Unknown chromosomes and empty ranges give the zero result.
pub fn search(
    handle: &IndexHandle,
    source: &Path,
    chromosome: &str,
    start: u64,
    end: u64,
) -> Result<QueryResult> {
    if end < start {
        return Err(Error::InvalidRange(format!(
            "end {} is before start {}",
            end, start
        )));
    }

    let Some((entry, cumulative)) = handle.chromosome(chromosome) else {
        debug!("{} is not in the index", chromosome);
        return Ok(QueryResult::default());
    };

    let bin_size = u64::from(handle.bin_size());
    let first_bin = start / bin_size;
    let last_bin = end / bin_size;

    let bins = &entry.bins;
    let lo = bins.partition_point(|b| u64::from(b.bin_index) < first_bin);
    let hi = bins.partition_point(|b| u64::from(b.bin_index) <= last_bin);
    if lo >= hi {
        return Ok(QueryResult::default());
    }
    debug!(
        "{}:{}-{} covers bins {}..{} of {}",
        chromosome,
        start,
        end,
        lo,
        hi,
        bins.len()
    );

    let mut probe = Probe {
        source,
        scanner: None,
        chromosome,
        start,
        end,
        first_bin,
        last_bin,
    };

    let head = probe.tally(&bins[lo])?;
    let (interior, tail) = if hi - lo >= 2 {
        (
            cumulative[hi - 1] - cumulative[lo + 1],
            probe.tally(&bins[hi - 1])?,
        )
    } else {
        (0, Tally::default())
    };

    let line_count = head.matched + interior + tail.matched;
    let offset = head.first.or(if hi - lo > 2 {
        Some(bins[lo + 1].first_offset)
    } else {
        tail.first
    });

    match offset {
        Some(offset) if line_count > 0 => Ok(QueryResult { line_count, offset }),
        _ => Ok(QueryResult::default()),
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    matched: u64,
    first: Option<u64>,
}

/// Bounded re-reads of boundary bins, sharing one cursor per search.
struct Probe<'a> {
    source: &'a Path,
    scanner: Option<OffsetScanner<BufReader<File>>>,
    chromosome: &'a str,
    start: u64,
    end: u64,
    first_bin: u64,
    last_bin: u64,
}

impl Probe<'_> {
    fn tally(&mut self, bin: &Bin) -> Result<Tally> {
        let bin_index = u64::from(bin.bin_index);
        if bin_index != self.first_bin && bin_index != self.last_bin {
            return Ok(Tally {
                matched: u64::from(bin.count),
                first: Some(bin.first_offset),
            });
        }

        let scanner = match &mut self.scanner {
            Some(scanner) => scanner,
            slot => slot.insert(source::scan(self.source)?),
        };
        scanner.seek_to(bin.first_offset)?;

        let mut tally = Tally::default();
        for _ in 0..bin.count {
            let record = match scanner.next() {
                Some(Ok(record)) => record,
                Some(Err(Error::Format { offset, message })) => {
                    return Err(Error::SourceMismatch { offset, message });
                }
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(Error::SourceMismatch {
                        offset: scanner.offset(),
                        message: format!("end of file inside bin {}", bin.bin_index),
                    });
                }
            };

            if record.chromosome != self.chromosome {
                return Err(Error::SourceMismatch {
                    offset: record.offset,
                    message: format!(
                        "expected {} but found {}",
                        self.chromosome, record.chromosome
                    ),
                });
            }
            if record.position > self.end {
                break;
            }
            if record.position >= self.start {
                tally.matched += 1;
                tally.first.get_or_insert(record.offset);
            }
        }

        Ok(tally)
    }
}
