pub mod r#async;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod source;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

pub use config::Config;
pub use engine::{VariantIndex, build, fetch, load, release, search};
pub use error::{Error, Result};
pub use index::IndexHandle;
pub use types::{DEFAULT_BIN_SIZE, IndexSummary, QueryResult};
