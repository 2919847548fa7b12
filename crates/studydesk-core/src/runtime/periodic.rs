use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

/// Owns a spawned repeating task. Dropping the handle aborts the task, so
/// teardown happens on every exit path of the owning scope.
#[derive(Debug)]
pub struct PeriodicHandle {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl PeriodicHandle {
    pub fn spawn<F>(name: &'static str, fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "spawning periodic task");
        Self {
            name,
            task: Some(tokio::spawn(fut)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Abort the task now.
    pub fn cancel(mut self) {
        self.abort();
    }

    /// Wait for the task to end on its own.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    debug!(task = self.name, "periodic task ended abnormally: {e}");
                }
            }
        }
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(task = self.name, "cancelling periodic task");
            task.abort();
        }
    }
}

impl Drop for PeriodicHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
