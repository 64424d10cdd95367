//! Shutdown coordination.
//!
//! One `Shutdown` per process. Long-running tasks subscribe to it; the entry
//! point triggers it once and then waits, bounded by a deadline, for the
//! server task to finish draining.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Upper bound on the graceful drain once a termination signal arrives.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// The drain did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainTimedOut;

/// Broadcast handle used to stop every subscribed task.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Subscribers that already exited are ignored.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    #[cfg(test)]
    fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger shutdown and wait up to `deadline` for `task` to finish.
    ///
    /// On expiry the task is aborted. For the HTTP server that cancels the
    /// connection tasks it owns, closing every connection still open.
    pub async fn drain<T>(
        &self,
        task: &mut JoinHandle<T>,
        deadline: Duration,
    ) -> Result<Result<T, tokio::task::JoinError>, DrainTimedOut> {
        self.trigger();

        match tokio::time::timeout(deadline, &mut *task).await {
            Ok(joined) => Ok(joined),
            Err(_) => {
                task.abort();
                Err(DrainTimedOut)
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
