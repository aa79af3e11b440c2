//! Access to the sorted, uncompressed text source being indexed.
//!
//! The source is any line-oriented file whose first two whitespace-separated
//! fields are a chromosome name and an unsigned position, grouped by
//! chromosome and sorted by position within each group (plain VCF qualifies).
//!
//! - [`OffsetScanner`] streams [`SourceRecord`]s with exact line offsets
//! - [`read_records`] extracts the bytes behind a [`QueryResult`]

mod scanner;

pub use scanner::OffsetScanner;

use crate::error::open;
use crate::types::QueryResult;
use crate::{Error, Result};
use bytes::Bytes;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// One data line of the source. Only exists while building or probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub chromosome: String,
    pub position: u64,
    /// Byte offset of the line's first character.
    pub offset: u64,
    /// Line length in bytes, terminator included.
    pub len: u64,
}

/// Open `path` and scan it from the first byte.
pub fn scan(path: &Path) -> Result<OffsetScanner<BufReader<File>>> {
    let file = open(path)?;
    Ok(OffsetScanner::new(BufReader::new(file)))
}

/// Read the raw lines of the records described by `result`.
///
/// The bytes span from the first matching record to the end of the last one,
/// so `#` or blank lines sitting between matched records come along
/// unchanged. Returns an empty buffer for the zero result.
pub fn read_records(path: &Path, result: &QueryResult) -> Result<Bytes> {
    if result.is_empty() {
        return Ok(Bytes::new());
    }

    let mut scanner = scan(path)?;
    scanner.seek_to(result.offset)?;

    let mut end = result.offset;
    let mut seen = 0u64;
    for record in scanner.by_ref().take(result.line_count as usize) {
        let record = record?;
        end = record.offset + record.len;
        seen += 1;
    }
    if seen < result.line_count {
        return Err(Error::SourceMismatch {
            offset: scanner.offset(),
            message: format!(
                "expected {} records from byte {}, found {}",
                result.line_count, result.offset, seen
            ),
        });
    }

    let mut reader = scanner.into_inner();
    reader.seek(SeekFrom::Start(result.offset))?;
    let mut buf = vec![0u8; (end - result.offset) as usize];
    reader.read_exact(&mut buf)?;

    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_records_slices_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let text = "#header\nchr1\t100\ta\nchr1\t150\tb\nchr1\t2500\tc\n";
        file.write_all(text.as_bytes()).unwrap();

        let result = QueryResult {
            line_count: 2,
            offset: 8,
        };
        let bytes = read_records(file.path(), &result).unwrap();
        assert_eq!(&bytes[..], b"chr1\t100\ta\nchr1\t150\tb\n");
    }

    #[test]
    fn test_read_records_keeps_interleaved_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"chr1\t1\ta\n#note\n\nchr1\t2\tb\nchr1\t3\tc\n")
            .unwrap();

        let result = QueryResult {
            line_count: 2,
            offset: 0,
        };
        let bytes = read_records(file.path(), &result).unwrap();
        assert_eq!(&bytes[..], b"chr1\t1\ta\n#note\n\nchr1\t2\tb\n");
    }

    #[test]
    fn test_read_records_past_end_is_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"chr1\t100\n").unwrap();

        let result = QueryResult {
            line_count: 3,
            offset: 0,
        };
        let err = read_records(file.path(), &result).unwrap_err();
        assert!(matches!(err, Error::SourceMismatch { .. }));
    }

    #[test]
    fn test_read_records_zero_result() {
        let bytes = read_records(Path::new("/nonexistent"), &QueryResult::default()).unwrap();
        assert!(bytes.is_empty());
    }
}
