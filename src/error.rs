//! Error handling types and utilities.

use crate::types::DocId;
use std::path::PathBuf;

/// A specialized Result type for spimi-index operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the build orchestration code.
pub type Result<T> = anyhow::Result<T>;

/// Error returned by the block accumulator when a document cannot be ingested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// The document was already ingested into the currently open block.
    #[error("document {0} was already ingested into the current block")]
    DuplicateDocument(DocId),
    /// The accumulator was finalized and accepts no further input.
    #[error("block accumulator has already been finalized")]
    AlreadyFinalized,
}

/// Error returned when reading or writing a block file.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// Block file not found at the expected path.
    #[error("block {number} not found at {}", path.display())]
    NotFound { number: u32, path: PathBuf },
    /// The file exists but does not hold a valid block.
    #[error("block {number} is corrupt: {reason}")]
    Corrupt { number: u32, reason: String },
    #[error("I/O error on block {number}: {source}")]
    Io {
        number: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode block {number}: {source}")]
    Encode {
        number: u32,
        #[source]
        source: postcard::Error,
    },
}

/// Error produced by a document source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The corpus itself cannot be read. Fatal for the build.
    #[error("document source unreachable: {0}")]
    Unreachable(String),
    /// A single document had no extractable text. The build skips it.
    #[error("document {doc_id} has no extractable text ({reason})")]
    MissingText { doc_id: DocId, reason: String },
}

impl SourceError {
    /// Whether this error should abort the whole build.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}
