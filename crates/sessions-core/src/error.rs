use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors produced by the event-sessions pipeline.
///
/// Per-record problems never surface here; they are reported as
/// [`SkippedRecord`](crate::models::SkippedRecord)s instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output table could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the sessions crates.
pub type Result<T> = std::result::Result<T, PipelineError>;
