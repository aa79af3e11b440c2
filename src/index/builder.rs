use super::{Bin, ChromosomeEntry, Index};
use crate::source::{OffsetScanner, SourceRecord};
use crate::{Error, Result};
use std::collections::HashSet;
use std::io::BufRead;
use tracing::debug;

/// Groups a sorted record stream into per-chromosome bins.
///
/// Only the last bin of the last chromosome is ever open; a new bin index or
/// a new chromosome closes it for good. Decreasing positions, or a chromosome
/// that shows up again after another one started, fail the build.
pub struct BinTableBuilder {
    bin_size: u32,
    chromosomes: Vec<ChromosomeEntry>,
    seen: HashSet<String>,
    last_position: u64,
}

impl BinTableBuilder {
    pub fn new(bin_size: u32) -> Result<Self> {
        if bin_size == 0 {
            return Err(Error::InvalidInput("bin size must be positive".to_string()));
        }
        Ok(Self {
            bin_size,
            chromosomes: Vec::new(),
            seen: HashSet::new(),
            last_position: 0,
        })
    }

    pub fn push(&mut self, record: SourceRecord) -> Result<()> {
        let bin_index = u32::try_from(record.position / u64::from(self.bin_size)).map_err(|_| {
            Error::Build {
                offset: record.offset,
                message: format!(
                    "position {} is too large for bin size {}",
                    record.position, self.bin_size
                ),
            }
        })?;

        if let Some(entry) = self
            .chromosomes
            .last_mut()
            .filter(|entry| entry.name == record.chromosome)
        {
            if record.position < self.last_position {
                return Err(Error::Build {
                    offset: record.offset,
                    message: format!(
                        "{} position {} follows {}",
                        record.chromosome, record.position, self.last_position
                    ),
                });
            }

            match entry.bins.last_mut() {
                Some(bin) if bin.bin_index == bin_index => {
                    bin.count = bin.count.checked_add(1).ok_or_else(|| Error::Build {
                        offset: record.offset,
                        message: format!("bin {} of {} holds too many records", bin_index, entry.name),
                    })?;
                }
                _ => entry.bins.push(Bin::open(bin_index, record.offset)),
            }
        } else {
            if let Some(previous) = self.chromosomes.last() {
                debug!(
                    "closed {} with {} bins, {} records",
                    previous.name,
                    previous.bins.len(),
                    previous.records()
                );
            }
            if !self.seen.insert(record.chromosome.clone()) {
                return Err(Error::Build {
                    offset: record.offset,
                    message: format!("records for {} are not contiguous", record.chromosome),
                });
            }
            self.chromosomes.push(ChromosomeEntry {
                name: record.chromosome,
                bins: vec![Bin::open(bin_index, record.offset)],
            });
        }

        self.last_position = record.position;
        Ok(())
    }

    pub fn finish(self, source_len: u64) -> Index {
        Index::new(self.bin_size, source_len, self.chromosomes)
    }
}

/// Drain a scanner into a finished index.
pub fn build_from<R: BufRead>(scanner: &mut OffsetScanner<R>, bin_size: u32) -> Result<Index> {
    let mut builder = BinTableBuilder::new(bin_size)?;
    for record in scanner.by_ref() {
        builder.push(record?)?;
    }
    Ok(builder.finish(scanner.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build(text: &str, bin_size: u32) -> Result<Index> {
        let mut scanner = OffsetScanner::new(Cursor::new(text.as_bytes().to_vec()));
        build_from(&mut scanner, bin_size)
    }

    #[test]
    fn test_bins_follow_positions() {
        let text = "chr1\t100\nchr1\t150\nchr1\t2500\nchr2\t10\n";
        let index = build(text, 1000).unwrap();

        assert_eq!(index.source_len(), text.len() as u64);
        let chr1 = &index.chromosomes()[0];
        assert_eq!(chr1.name, "chr1");
        assert_eq!(
            chr1.bins,
            vec![
                Bin {
                    bin_index: 0,
                    count: 2,
                    first_offset: 0,
                },
                Bin {
                    bin_index: 2,
                    count: 1,
                    first_offset: 18,
                },
            ]
        );
        let chr2 = &index.chromosomes()[1];
        assert_eq!(chr2.bins.len(), 1);
        assert_eq!(chr2.bins[0].first_offset, 28);
    }

    #[test]
    fn test_empty_source() {
        let index = build("##only a header\n", 1000).unwrap();
        assert!(index.chromosomes().is_empty());
    }

    #[test]
    fn test_single_record() {
        let index = build("chrX\t42\n", 10).unwrap();
        assert_eq!(index.chromosomes().len(), 1);
        assert_eq!(index.chromosomes()[0].bins[0].bin_index, 4);
        assert_eq!(index.chromosomes()[0].bins[0].count, 1);
    }

    #[test]
    fn test_equal_positions_share_bin() {
        let index = build("chr1\t5\nchr1\t5\nchr1\t5\n", 1000).unwrap();
        assert_eq!(index.chromosomes()[0].bins[0].count, 3);
    }

    #[test]
    fn test_decreasing_position_fails() {
        let err = build("chr1\t500\nchr1\t400\n", 1000).unwrap_err();
        match err {
            Error::Build { offset, .. } => assert_eq!(offset, 9),
            other => panic!("expected build error, got {:?}", other),
        }
    }

    #[test]
    fn test_regrouped_chromosome_fails() {
        let err = build("chr1\t1\nchr2\t1\nchr1\t9\n", 1000).unwrap_err();
        assert!(matches!(err, Error::Build { offset: 14, .. }));
    }

    #[test]
    fn test_position_resets_on_new_chromosome() {
        let index = build("chr1\t9000\nchr2\t1\n", 1000).unwrap();
        assert_eq!(index.chromosomes()[1].bins[0].bin_index, 0);
    }

    #[test]
    fn test_zero_bin_size_rejected() {
        assert!(matches!(build("chr1\t1\n", 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_bin_index_beyond_u32_fails() {
        let err = build("chr1\t5000000000\n", 1).unwrap_err();
        match err {
            Error::Build { offset, message } => {
                assert_eq!(offset, 0);
                assert!(message.contains("too large"), "{}", message);
            }
            other => panic!("expected build error, got {:?}", other),
        }
        // the same position fits once bins are wide enough
        assert!(build("chr1\t5000000000\n", 1000).is_ok());
    }

    #[test]
    fn test_full_bin_count_fails() {
        let record = |position, offset| SourceRecord {
            chromosome: "chr1".to_string(),
            position,
            offset,
            len: 8,
        };
        let mut builder = BinTableBuilder::new(1000).unwrap();
        builder.push(record(1, 0)).unwrap();
        // filling a bin for real would take u32::MAX records
        builder.chromosomes[0].bins[0].count = u32::MAX;

        let err = builder.push(record(2, 8)).unwrap_err();
        match err {
            Error::Build { offset, message } => {
                assert_eq!(offset, 8);
                assert!(message.contains("too many records"), "{}", message);
            }
            other => panic!("expected build error, got {:?}", other),
        }
    }
}
