//! Batching queue worker
//!
//! Consumes candidate archive paths from the watcher's queue on a fixed
//! polling cadence. Each poll attempt takes at most one path and adds it to
//! the current batch, a set, so repeated notifications for the same path
//! collapse into one extraction. After every `polls_per_batch` attempts,
//! counted whether or not anything was dequeued, the batch is drained: each
//! unique path is handed to the unpack handler on a blocking thread, and a
//! failing archive is logged and skipped so it never stops the rest of the
//! batch. Bursts of archives (a bulk copy, say) thus consolidate into few
//! extraction passes at the cost of up to one window of extra latency.

use crate::config::WatchConfig;
use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};
use tokio::task::spawn_blocking;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Deduplicating, batching consumer of candidate archive paths
///
/// Generic over the unpack handler so the extraction policy stays testable
/// in isolation; production wires in
/// [`ArchiveExtractor::extract`](crate::extraction::ArchiveExtractor::extract).
pub struct BatchWorker<F> {
    /// Queue of candidate paths, fed by the watch loop
    rx: UnboundedReceiver<PathBuf>,

    /// Handler invoked once per unique path per drain pass
    unpack: F,

    /// Interval between queue poll attempts
    poll_interval: Duration,

    /// Poll attempts per collect window
    polls_per_batch: u32,

    /// Pause after a drain pass that did any work
    drain_pause: Duration,
}

impl<F> BatchWorker<F>
where
    F: Fn(&Path) -> Result<()> + Send + 'static + Clone,
{
    /// Create a worker over the given queue with the configured cadence
    pub fn new(rx: UnboundedReceiver<PathBuf>, unpack: F, config: &WatchConfig) -> Self {
        Self {
            rx,
            unpack,
            poll_interval: config.poll_interval,
            polls_per_batch: config.polls_per_batch,
            drain_pause: config.drain_pause,
        }
    }

    /// Run the collect/drain loop
    ///
    /// Runs until the queue's sender side is dropped; any paths still
    /// batched at that point are drained before returning. In production
    /// the watcher holds the sender for the life of the process, so this
    /// effectively runs forever.
    pub async fn run(mut self) {
        let mut batch: HashSet<PathBuf> = HashSet::new();
        let mut polls = 0u32;

        loop {
            sleep(self.poll_interval).await;
            polls += 1;

            match self.rx.try_recv() {
                Ok(path) => {
                    debug!(path = %path.display(), "queued for next drain pass");
                    batch.insert(path);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.drain(&mut batch).await;
                    info!("queue closed, batch worker stopping");
                    return;
                }
            }

            // The attempt counter resets whether or not anything arrived.
            if polls >= self.polls_per_batch {
                polls = 0;
                if !batch.is_empty() {
                    self.drain(&mut batch).await;
                    sleep(self.drain_pause).await;
                }
            }
        }
    }

    /// Drain the current batch, isolating failures per archive
    async fn drain(&self, batch: &mut HashSet<PathBuf>) {
        for path in batch.drain() {
            info!(archive = %path.display(), "unpacking");
            let unpack = self.unpack.clone();
            let task_path = path.clone();
            match spawn_blocking(move || unpack(&task_path)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(archive = %path.display(), error = %e, "extraction failed");
                }
                Err(join_err) => {
                    error!(archive = %path.display(), error = %join_err, "extraction task panicked");
                }
            }
        }
    }
}
