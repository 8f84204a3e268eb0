//! # zipwatch
//!
//! Watch a directory tree and automatically extract zip archives as they
//! arrive, repairing member filenames whose byte encoding is ambiguous.
//!
//! Legacy zip tools store non-UTF-8 filenames without setting the per-entry
//! UTF-8 flag; zipwatch runs statistical charset detection over those raw
//! bytes so a `GBK`-named member unpacks as readable text instead of
//! mojibake.
//!
//! ## Pipeline
//!
//! OS events → [`DirWatcher`] → [`EventFilter`] → queue → [`BatchWorker`] →
//! [`ArchiveExtractor`] → filesystem.
//!
//! The watcher and the worker are independent tasks communicating only
//! through an unbounded channel. The worker polls the queue on a fixed
//! cadence, deduplicates paths into per-window batches, and isolates
//! per-archive failures so one corrupt file never stops the rest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zipwatch::{ArchiveExtractor, BatchWorker, DirWatcher, WatchConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> zipwatch::Result<()> {
//!     let config = WatchConfig::default();
//!     let (tx, rx) = mpsc::unbounded_channel();
//!
//!     let worker = BatchWorker::new(rx, |path| ArchiveExtractor::extract(path), &config);
//!     tokio::spawn(worker.run());
//!
//!     let mut watcher = DirWatcher::new(&config, tx)?;
//!     watcher.start()?;
//!     watcher.run().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Filename encoding recovery
pub mod encoding;
/// Error types
pub mod error;
/// Archive extraction and target resolution
pub mod extraction;
/// Event filtering
pub mod filter;
/// Directory watching
pub mod watcher;
/// Batching queue worker
pub mod worker;

// Re-export commonly used types
pub use config::WatchConfig;
pub use encoding::{decode_filename, guess_encoding};
pub use error::{Error, ExtractionError, Result};
pub use extraction::{ArchiveExtractor, resolve_target};
pub use filter::EventFilter;
pub use watcher::DirWatcher;
pub use worker::BatchWorker;
