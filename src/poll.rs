//! Background update loop.
//!
//! Runs [`Reader::update_all`] on a tokio task, sends every cycle's
//! [`UpdateReport`] to the caller over a channel, then sleeps for the poll
//! interval.  Shutdown is only observed between cycles: a cycle that has
//! started always finishes its merge and delivery first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::reader::{Reader, UpdateReport};

/// Handle to a running poll loop.
pub struct PollHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Ask the loop to stop after the current cycle.
    pub fn shutdown(&self) {
        self.stop.notify_one();
    }

    /// Wait for the loop to exit.  The reader is closed by then.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "poll task ended abnormally");
        }
    }
}

/// Spawn the poll loop.
///
/// Returns the handle and a receiver carrying one report per cycle.  If the
/// receiver is dropped the loop keeps running; reports are simply discarded.
pub fn spawn(
    reader: Reader,
    interval: Duration,
) -> (PollHandle, mpsc::UnboundedReceiver<UpdateReport>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stop = Arc::new(Notify::new());
    let signal = Arc::clone(&stop);

    let task = tokio::spawn(async move {
        loop {
            match reader.update_all().await {
                Ok(report) => {
                    let _ = tx.send(report);
                }
                Err(e) => {
                    info!(error = %e, "stopping poll loop");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = signal.notified() => break,
            }
        }
        reader.shutdown().await;
    });

    (PollHandle { stop, task }, rx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
