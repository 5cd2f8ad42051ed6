// src/error.rs

//! Error types for the synchronization engine
//!
//! Every failure is fatal: errors propagate with `?` to the binary entry
//! point, which reports them and exits non-zero. There is no retry or
//! skip-and-continue anywhere in the engine.

use thiserror::Error;

/// Errors surfaced by the synchronization engine
///
/// Messages carry the failing URL or path; callers add no further context.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection failure or non-success HTTP status
    #[error("network error: {0}")]
    NetworkError(String),

    /// Missing or invalid Content-Length, malformed desc record
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Create/read/copy/remove/stat failure on the local mirror
    #[error("filesystem error: {0}")]
    FilesystemError(String),

    /// Unrecognized compression or corrupt database archive
    #[error("archive error: {0}")]
    ArchiveError(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
