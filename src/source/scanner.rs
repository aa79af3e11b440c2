use super::SourceRecord;
use crate::{Error, Result};
use std::io::{BufRead, Seek, SeekFrom};

/// Streams records out of a sorted text source, tracking the byte offset of
/// every line.
///
/// `#` header/comment lines and blank lines are skipped, but their bytes still
/// advance the offset. The iterator stops after the first error.
pub struct OffsetScanner<R> {
    reader: R,
    offset: u64,
    buf: Vec<u8>,
    failed: bool,
}

impl<R: BufRead> OffsetScanner<R> {
    pub fn new(reader: R) -> Self {
        Self::starting_at(reader, 0)
    }

    /// Scanner over a reader already positioned at `offset` in its file.
    pub fn starting_at(reader: R, offset: u64) -> Self {
        Self {
            reader,
            offset,
            buf: Vec::with_capacity(1024),
            failed: false,
        }
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn next_record(&mut self) -> Result<Option<SourceRecord>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }

            let line_offset = self.offset;
            self.offset += n as u64;

            let line = trim_line_end(&self.buf);
            if line.first() == Some(&b'#') || line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let (chromosome, position) = parse_fields(line, line_offset)?;
            return Ok(Some(SourceRecord {
                chromosome,
                position,
                offset: line_offset,
                len: n as u64,
            }));
        }
    }
}

impl<R: BufRead + Seek> OffsetScanner<R> {
    /// Reposition at a known line start.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        self.failed = false;
        Ok(())
    }
}

impl<R: BufRead> Iterator for OffsetScanner<R> {
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_record().transpose();
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Extract the chromosome and position from the two leading fields.
pub(crate) fn parse_fields(line: &[u8], offset: u64) -> Result<(String, u64)> {
    let mut fields = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|field| !field.is_empty());

    let chromosome = fields
        .next()
        .ok_or_else(|| malformed(offset, "missing chromosome"))?;
    let position = fields
        .next()
        .ok_or_else(|| malformed(offset, "missing position"))?;

    let chromosome = std::str::from_utf8(chromosome)
        .map_err(|_| malformed(offset, "chromosome is not valid UTF-8"))?;
    let position = std::str::from_utf8(position)
        .ok()
        .and_then(|p| p.parse::<u64>().ok())
        .ok_or_else(|| {
            malformed(
                offset,
                format!("invalid position {:?}", String::from_utf8_lossy(position)),
            )
        })?;

    Ok((chromosome.to_string(), position))
}

fn malformed(offset: u64, message: impl Into<String>) -> Error {
    Error::Format {
        offset,
        message: message.into(),
    }
}
