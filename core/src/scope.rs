//! Tasks tied to the lifetime of a view.
//!
//! A screen spawns its fetches through its `ViewScope`. When the screen goes
//! away the scope is dropped (or `cancel_all` is called) and every task still
//! running is aborted, so no late result is written into state nobody shows.

use std::future::Future;

use tokio::task::{AbortHandle, JoinSet};
use tracing::debug;

#[derive(Debug)]
pub struct ViewScope {
    name: &'static str,
    tasks: JoinSet<()>,
}

impl ViewScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: JoinSet::new(),
        }
    }

    /// Run `task` until it finishes or the scope is torn down. Must be
    /// called from within a tokio runtime.
    pub fn spawn<Fut>(&mut self, task: Fut) -> AbortHandle
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Reap finished tasks so a long-lived scope does not accumulate them.
        while self.tasks.try_join_next().is_some() {}
        self.tasks.spawn(task)
    }

    /// Tasks spawned and not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort everything still running.
    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            debug!(scope = self.name, tasks = self.tasks.len(), "cancelling view tasks");
        }
        self.tasks.abort_all();
    }

    /// Wait for every task to finish or be cancelled.
    pub async fn join_all(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
