//! On-disk layout of the companion index file.
//!
//! All integers are little-endian.
//!
//! ## Header (32 bytes)
//! - Magic: `VIDX` (4 bytes)
//! - Format version (u32)
//! - Bin size (u32)
//! - Number of chromosomes (u32)
//! - Length of the indexed source in bytes (u64)
//! - Total length of the index file in bytes (u64)
//!
//! ## Chromosome directory (per chromosome, first-seen order)
//! - Name length (u32) followed by the UTF-8 name
//! - Number of bins (u32)
//! - File offset of the chromosome's bin array (u64)
//!
//! ## Bin arrays (16 bytes per bin, one contiguous array per chromosome)
//! - Bin index (u32)
//! - Record count (u32)
//! - Offset of the bin's first record in the source (u64)
//!
//! The declared total length lets the loader reject a file cut short by an
//! interrupted write before any bin array is read.

use super::{Bin, ChromosomeEntry, Index};
use crate::error::open;
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAGIC: &[u8; 4] = b"VIDX";
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: u64 = 32;
const BIN_LEN: u64 = 16;

pub fn encode(index: &Index) -> Result<Vec<u8>> {
    let directory_len: u64 = index
        .chromosomes()
        .iter()
        .map(|entry| 4 + entry.name.len() as u64 + 4 + 8)
        .sum();
    let bins_len: u64 = index
        .chromosomes()
        .iter()
        .map(|entry| entry.bins.len() as u64 * BIN_LEN)
        .sum();
    let total_len = HEADER_LEN + directory_len + bins_len;

    let mut buf = Vec::with_capacity(total_len as usize);
    buf.write_all(MAGIC)?;
    buf.write_u32::<LittleEndian>(FORMAT_VERSION)?;
    buf.write_u32::<LittleEndian>(index.bin_size())?;
    buf.write_u32::<LittleEndian>(u32_len(index.chromosomes().len(), "chromosome count")?)?;
    buf.write_u64::<LittleEndian>(index.source_len())?;
    buf.write_u64::<LittleEndian>(total_len)?;

    let mut bins_offset = HEADER_LEN + directory_len;
    for entry in index.chromosomes() {
        buf.write_u32::<LittleEndian>(u32_len(entry.name.len(), "chromosome name")?)?;
        buf.write_all(entry.name.as_bytes())?;
        buf.write_u32::<LittleEndian>(u32_len(entry.bins.len(), "bin count")?)?;
        buf.write_u64::<LittleEndian>(bins_offset)?;
        bins_offset += entry.bins.len() as u64 * BIN_LEN;
    }

    for entry in index.chromosomes() {
        for bin in &entry.bins {
            buf.write_u32::<LittleEndian>(bin.bin_index)?;
            buf.write_u32::<LittleEndian>(bin.count)?;
            buf.write_u64::<LittleEndian>(bin.first_offset)?;
        }
    }

    Ok(buf)
}

fn u32_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::InvalidInput(format!("{} {} exceeds u32", what, len)))
}

/// Parse and validate an index image. `path` is only used in error messages.
pub fn decode(data: &[u8], path: &Path) -> Result<Index> {
    if (data.len() as u64) < HEADER_LEN {
        return Err(Error::corrupt(path, "truncated header"));
    }

    let truncated = |_| Error::corrupt(path, "truncated chromosome directory");
    let mut cursor = Cursor::new(data);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::corrupt(path, "not an index file (bad magic)"));
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(Error::corrupt(
            path,
            format!("unsupported format version {}", version),
        ));
    }

    let bin_size = cursor.read_u32::<LittleEndian>()?;
    let n_chromosomes = cursor.read_u32::<LittleEndian>()?;
    let source_len = cursor.read_u64::<LittleEndian>()?;
    let total_len = cursor.read_u64::<LittleEndian>()?;

    if total_len != data.len() as u64 {
        return Err(Error::corrupt(
            path,
            format!("declares {} bytes but holds {}", total_len, data.len()),
        ));
    }
    if bin_size == 0 {
        return Err(Error::corrupt(path, "bin size is zero"));
    }

    let mut seen = HashSet::new();
    let mut chromosomes = Vec::new();
    for _ in 0..n_chromosomes {
        let name_len = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        if cursor.position() + name_len > total_len {
            return Err(Error::corrupt(path, "chromosome name runs past end of file"));
        }
        let mut name = vec![0u8; name_len as usize];
        cursor.read_exact(&mut name).map_err(truncated)?;
        let name = String::from_utf8(name)
            .map_err(|_| Error::corrupt(path, "chromosome name is not valid UTF-8"))?;

        let n_bins = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let bins_offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;

        let bins_end = bins_offset
            .checked_add(u64::from(n_bins) * BIN_LEN)
            .filter(|&end| bins_offset >= HEADER_LEN && end <= total_len)
            .ok_or_else(|| {
                Error::corrupt(path, format!("bin array of {} runs past end of file", name))
            })?;

        let bins = decode_bins(&data[bins_offset as usize..bins_end as usize])
            .map_err(|message| Error::corrupt(path, format!("{}: {}", name, message)))?;

        if !seen.insert(name.clone()) {
            return Err(Error::corrupt(path, format!("duplicate chromosome {}", name)));
        }
        chromosomes.push(ChromosomeEntry { name, bins });
    }

    Ok(Index::new(bin_size, source_len, chromosomes))
}

fn decode_bins(mut data: &[u8]) -> std::result::Result<Vec<Bin>, String> {
    let mut bins: Vec<Bin> = Vec::with_capacity(data.len() / BIN_LEN as usize);
    while !data.is_empty() {
        let bin = Bin {
            bin_index: data.read_u32::<LittleEndian>().map_err(|e| e.to_string())?,
            count: data.read_u32::<LittleEndian>().map_err(|e| e.to_string())?,
            first_offset: data.read_u64::<LittleEndian>().map_err(|e| e.to_string())?,
        };
        if bin.count == 0 {
            return Err(format!("bin {} is empty", bin.bin_index));
        }
        if let Some(prev) = bins.last() {
            if bin.bin_index <= prev.bin_index || bin.first_offset <= prev.first_offset {
                return Err(format!("bin {} is out of order", bin.bin_index));
            }
        }
        bins.push(bin);
    }
    if bins.is_empty() {
        return Err("no bins".to_string());
    }
    Ok(bins)
}

/// Persist `index` at `path`, replacing any previous file only once the new
/// one is completely on disk.
pub fn write(path: &Path, index: &Index) -> Result<()> {
    let data = encode(index)?;
    let tmp = tmp_path(path);

    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(&data)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

pub fn read(path: &Path) -> Result<Index> {
    let mut data = Vec::new();
    open(path)?.read_to_end(&mut data)?;
    decode(&data, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Index {
        Index::new(
            1000,
            38,
            vec![
                ChromosomeEntry {
                    name: "chr1".to_string(),
                    bins: vec![
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
                    ],
                },
                ChromosomeEntry {
                    name: "chr2".to_string(),
                    bins: vec![Bin {
                        bin_index: 0,
                        count: 1,
                        first_offset: 28,
                    }],
                },
            ],
        )
    }

    fn path() -> &'static Path {
        Path::new("sample.vcf.idx")
    }

    #[test]
    fn test_encode_layout() {
        let data = encode(&sample()).unwrap();
        // header + two directory entries + three bins
        assert_eq!(data.len(), 32 + 2 * (4 + 4 + 4 + 8) + 3 * 16);
        assert_eq!(&data[..4], b"VIDX");
        assert_eq!(u64::from_le_bytes(data[24..32].try_into().unwrap()), data.len() as u64);
        assert_eq!(decode(&data, path()).unwrap(), sample());
    }

    #[test]
    fn test_truncated_after_header() {
        let data = encode(&sample()).unwrap();
        let err = decode(&data[..32], path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex { .. }));
    }

    #[test]
    fn test_truncated_header() {
        let data = encode(&sample()).unwrap();
        assert!(matches!(
            decode(&data[..10], path()),
            Err(Error::CorruptIndex { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = encode(&sample()).unwrap();
        data[0] = b'X';
        assert!(matches!(decode(&data, path()), Err(Error::CorruptIndex { .. })));
    }

    #[test]
    fn test_unknown_version() {
        let mut data = encode(&sample()).unwrap();
        data[4] = 9;
        assert!(matches!(decode(&data, path()), Err(Error::CorruptIndex { .. })));
    }

    #[test]
    fn test_out_of_order_bins() {
        let mut index = sample();
        index.chromosomes[0].bins.swap(0, 1);
        let data = encode(&index).unwrap();
        let err = decode(&data, path()).unwrap_err();
        assert!(err.to_string().contains("out of order"), "{}", err);
    }

    #[test]
    fn test_bin_array_past_end() {
        let mut data = encode(&sample()).unwrap();
        // first directory entry's bin count
        data[32 + 4 + 4] = 200;
        assert!(matches!(decode(&data, path()), Err(Error::CorruptIndex { .. })));
    }

    #[test]
    fn test_write_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("calls.vcf.idx");
        std::fs::write(&target, b"stale").unwrap();

        write(&target, &sample()).unwrap();

        assert_eq!(read(&target).unwrap(), sample());
        assert!(!tmp_path(&target).exists());
    }

    // sample() layout: chr1 directory entry at 32..52, chr2 at 52..72,
    // bin arrays from 72
    #[test]
    fn test_empty_bin() {
        let mut data = encode(&sample()).unwrap();
        data[76..80].copy_from_slice(&0u32.to_le_bytes());
        let err = decode(&data, path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex { .. }));
        assert!(err.to_string().contains("empty"), "{}", err);
    }

    #[test]
    fn test_duplicate_chromosome() {
        let mut data = encode(&sample()).unwrap();
        assert_eq!(&data[56..60], b"chr2");
        data[59] = b'1';
        let err = decode(&data, path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex { .. }));
        assert!(err.to_string().contains("duplicate chromosome chr1"), "{}", err);
    }

    #[test]
    fn test_name_not_utf8() {
        let mut data = encode(&sample()).unwrap();
        assert_eq!(&data[36..40], b"chr1");
        data[36] = 0xff;
        let err = decode(&data, path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex { .. }));
        assert!(err.to_string().contains("UTF-8"), "{}", err);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read(&dir.path().join("none.idx")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
