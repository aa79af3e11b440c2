use serde::{Deserialize, Serialize};

/// Default width of a bin, in positions.
pub const DEFAULT_BIN_SIZE: u32 = 1000;

/// Answer to a range query.
///
/// `offset` is the byte position of the first matching record and
/// `line_count` the number of consecutive matching records from there.
/// No match is `(0, 0)`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub line_count: u64,
    pub offset: u64,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }
}

/// Description of a loaded index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub version: u32,
    pub bin_size: u32,
    pub source_len: u64,
    pub chromosomes: Vec<ChromosomeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromosomeSummary {
    pub name: String,
    pub bins: usize,
    pub records: u64,
    pub first_offset: u64,
}

impl IndexSummary {
    pub fn records(&self) -> u64 {
        self.chromosomes.iter().map(|c| c.records).sum()
    }
}
