//! Bounded pool for plugin work.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Runs plugin tasks with at most `limit` in flight.
///
/// Tasks beyond the limit wait for a permit. On shutdown the pool stops
/// accepting, waits out a grace period, then cancels whatever is left.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Self {
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(limit.max(1))),
            cancel: CancellationToken::new(),
        }
    }

    /// Queue a bounded task.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return,
                permit = permits.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };
            tokio::select! {
                _ = cancel.cancelled() => debug!("worker task cancelled"),
                _ = task => {}
            }
        });
    }

    /// Run a task outside the limit, still cancelled on shutdown.
    /// Used for connect attempts, which mostly sleep.
    pub fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = task => {}
            }
        });
    }

    /// Tasks queued or running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Stop accepting work, wait up to `grace`, then cancel the rest.
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(pending = self.tracker.len(), "worker tasks still running, cancelling");
            self.cancel.cancel();
            self.tracker.wait().await;
        }
    }
}
