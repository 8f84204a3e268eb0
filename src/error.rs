//! Error types for zipwatch
//!
//! Nothing in the extraction pipeline is fatal to the process: a vanished
//! archive is a silent no-op, undecodable filename bytes are recovered with
//! replacement characters, and any other per-archive failure is caught at the
//! batch-worker boundary and logged. These types exist so that boundary has
//! something structured to log.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for zipwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for zipwatch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the configuration issue
        message: String,
    },

    /// Filesystem watcher error (subscription failed, watch root unusable)
    #[error("watch error: {0}")]
    Watch(String),

    /// Invalid exclusion pattern
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Archive extraction error
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced per archive by the extractor
///
/// A missing archive is deliberately *not* represented here: a file that
/// vanished between enqueue and processing is skipped silently.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive exists but cannot be opened or read as a zip file
    #[error("failed to read archive {archive}: {reason}")]
    ArchiveUnreadable {
        /// Path to the offending archive
        archive: PathBuf,
        /// Why the archive could not be read
        reason: String,
    },

    /// Writing one member to disk failed
    #[error("failed to write member {member} of {archive}: {source}")]
    MemberWrite {
        /// Path to the archive being extracted
        archive: PathBuf,
        /// Decoded name of the member that failed
        member: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
