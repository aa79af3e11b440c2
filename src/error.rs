use std::path::Path;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed record at byte {offset}: {message}")]
    Format { offset: u64, message: String },

    #[error("unsorted input at byte {offset}: {message}")]
    Build { offset: u64, message: String },

    #[error("corrupt index {path}: {message}")]
    CorruptIndex { path: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("source does not match index at byte {offset}: {message}")]
    SourceMismatch { offset: u64, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Format { .. } => "FormatError",
            Error::Build { .. } => "BuildError",
            Error::CorruptIndex { .. } => "CorruptIndexError",
            Error::NotFound(_) => "NotFoundError",
            Error::SourceMismatch { .. } => "SourceMismatch",
            Error::InvalidInput(_) => "InvalidInput",
            Error::InvalidRange(_) => "InvalidRange",
            Error::Io(_) | Error::Internal(_) => "InternalError",
        }
    }

    pub(crate) fn corrupt(path: &Path, message: impl Into<String>) -> Self {
        Error::CorruptIndex {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

/// Open a file for reading, mapping a missing file to [`Error::NotFound`].
pub(crate) fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = open(&dir.path().join("missing.vcf")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.kind(), "NotFoundError");
    }

    #[test]
    fn test_format_error_mentions_offset() {
        let err = Error::Format {
            offset: 42,
            message: "missing position".to_string(),
        };
        assert_eq!(err.to_string(), "malformed record at byte 42: missing position");
    }
}
