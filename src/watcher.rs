//! Recursive directory watching for new zip archives
//!
//! Subscribes to filesystem notifications for the configured root and every
//! directory below it, including directories created after the watch starts.
//! Each raw event goes through the [`EventFilter`]; accepted paths are
//! enqueued for the [batch worker](crate::worker::BatchWorker). The loop has
//! no graceful-stop API by design: it runs until the process exits or the
//! notification channel closes.
//!
//! # Example
//!
//! ```no_run
//! use zipwatch::{BatchWorker, DirWatcher, WatchConfig, ArchiveExtractor};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> zipwatch::Result<()> {
//! let config = WatchConfig::default();
//! let (tx, rx) = mpsc::unbounded_channel();
//!
//! let worker = BatchWorker::new(rx, |path| ArchiveExtractor::extract(path), &config);
//! tokio::spawn(worker.run());
//!
//! let mut watcher = DirWatcher::new(&config, tx)?;
//! watcher.start()?;
//! watcher.run().await;
//! # Ok(())
//! # }
//! ```

use crate::config::WatchConfig;
use crate::error::{Error, Result};
use crate::filter::EventFilter;
use notify::{
    Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Watches a directory tree and enqueues finished zip archives
pub struct DirWatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Channel for receiving raw filesystem events
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Decides which events name an extractable archive
    filter: EventFilter,

    /// Queue feeding the batch worker
    queue: mpsc::UnboundedSender<PathBuf>,

    /// Root of the recursive watch
    root: PathBuf,
}

impl DirWatcher {
    /// Create a new directory watcher feeding the given queue
    ///
    /// # Errors
    /// Returns an error if an exclusion pattern is invalid or the
    /// filesystem watcher cannot be initialized.
    pub fn new(config: &WatchConfig, queue: mpsc::UnboundedSender<PathBuf>) -> Result<Self> {
        let filter = EventFilter::new(&config.exclude)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("failed to forward filesystem event: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::Watch(e.to_string()))?;

        Ok(Self {
            watcher,
            rx,
            filter,
            queue,
            root: config.root.clone(),
        })
    }

    /// Start watching the configured root recursively
    ///
    /// Creates the root directory first if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the root cannot be created or watched.
    pub fn start(&mut self) -> Result<()> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)
                .map_err(|e| Error::Watch(format!("failed to create watch root: {e}")))?;
            info!(root = %self.root.display(), "created watch root");
        }

        self.watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("failed to watch root: {e}")))?;

        info!(root = %self.root.display(), "watching for zip archives");
        Ok(())
    }

    /// Run the watch loop
    ///
    /// Processes raw filesystem events until the event channel closes, which
    /// only happens at process shutdown. Watcher-reported errors are logged
    /// and skipped; they never terminate the loop.
    pub async fn run(mut self) {
        while let Some(result) = self.rx.recv().await {
            match result {
                Ok(event) => {
                    for path in self.filter.accept(&event) {
                        debug!(path = %path.display(), "enqueueing archive");
                        if self.queue.send(path).is_err() {
                            info!("extraction queue closed, watcher stopping");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("filesystem watcher error: {}", e);
                }
            }
        }
        info!("watch channel closed, watcher stopping");
    }
}
