//! Detached work that must finish before the process exits.
//!
//! Handlers hand off post-response work (log shipping) here. The handler
//! never awaits it; shutdown does. Request tasks are tracked too, so one
//! outliving its client still finishes before the final flush.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Tracker for fire-and-forget tasks.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` in the background. Returns immediately.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Run `task` in the background and hand back its handle.
    pub fn spawn_tracked<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait for every spawned task, giving up after `deadline`.
    ///
    /// Returns `false` if tasks were still running at the deadline.
    pub async fn drain(&self, deadline: Duration) -> bool {
        self.tracker.close();
        let finished = tokio::time::timeout(deadline, self.tracker.wait()).await.is_ok();
        if !finished {
            tracing::warn!(remaining = self.tracker.len(), "Background tasks still running at drain deadline");
        }
        finished
    }
}
