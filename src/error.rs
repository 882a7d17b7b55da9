//! Error types for the index build and search pipeline.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation. Each subsystem gets its own enum; all of
//! them fold into [`Error`] at the crate boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level crate error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("archive is corrupt: {0}")]
    ArchiveCorrupt(#[from] zip::result::ZipError),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("pattern is invalid: {0}")]
    PatternInvalid(String),

    #[error("search exceeded the match limit ({limit} matches)")]
    LimitExceeded { limit: usize },

    #[error("manifest missing at {dir}")]
    ManifestMissing { dir: PathBuf },

    #[error("manifest corrupt at {dir}: {source}")]
    ManifestCorrupt {
        dir: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("index is closed")]
    IndexClosed,

    #[error("trigram index error: {0}")]
    Trigram(#[from] TrigramError),

    #[error("trigram index is corrupt: {0}")]
    TrigramReader(#[from] crate::trigram::reader::ReaderError),

    #[error("exclusion log error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writer-side rejections from the trigram index store.
///
/// Per the on-disk contract, any of these collapse to the single
/// exclusion-log reason `"Binary files are excluded."` when surfaced
/// by the ingestion pipeline; the distinct variant survives only for
/// diagnostics (`tracing::debug!`).
#[derive(Error, Debug)]
pub enum TrigramError {
    #[error("file too long ({size} > {max})")]
    FileTooLong { size: u64, max: u64 },

    #[error("too many trigrams ({count} > {max})")]
    TooManyTrigrams { count: usize, max: usize },

    #[error("line too long ({len} > {max})")]
    LineTooLong { len: usize, max: usize },

    #[error("I/O error while reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("writer already flushed")]
    AlreadyFlushed,
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for trigram writer/reader operations.
pub type TrigramResult<T> = std::result::Result<T, TrigramError>;

impl Error {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ArchiveCorrupt(_) => "ARCHIVE_CORRUPT",
            Self::Io(_) => "IO_FAILURE",
            Self::PatternInvalid(_) => "PATTERN_INVALID",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::ManifestMissing { .. } => "MANIFEST_MISSING",
            Self::ManifestCorrupt { .. } => "MANIFEST_CORRUPT",
            Self::IndexClosed => "INDEX_CLOSED",
            Self::Trigram(e) => e.code(),
            Self::TrigramReader(_) => "TRIGRAM_INDEX_CORRUPT",
            Self::Json(_) => "EXCLUSION_LOG_ERROR",
        }
    }
}

impl TrigramError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileTooLong { .. } => "FILE_TOO_LONG",
            Self::TooManyTrigrams { .. } => "TOO_MANY_TRIGRAMS",
            Self::LineTooLong { .. } => "LINE_TOO_LONG",
            Self::Io(_) => "TRIGRAM_IO_ERROR",
            Self::AlreadyFlushed => "WRITER_ALREADY_FLUSHED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(Error::IndexClosed.code(), "INDEX_CLOSED");
        assert_eq!(
            Error::LimitExceeded { limit: 1000 }.code(),
            "LIMIT_EXCEEDED"
        );
    }

    #[test]
    fn trigram_error_codes_are_stable() {
        assert_eq!(
            TrigramError::FileTooLong { size: 2, max: 1 }.code(),
            "FILE_TOO_LONG"
        );
    }
}
