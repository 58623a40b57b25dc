//! Polling task worker
//!
//! Each worker owns a logger scope `app.worker_<id>`. Every fetched task
//! runs under a context anchored below that scope with the task id as
//! trace id, so all records for one task share a prefix.

use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use wizard_trace::{LoggerScope, Payload, TraceContext};

use crate::backend::{BackendResult, TaskSource};
use crate::entity::Task;
use crate::router::FunctionRouter;

/// Worker pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_count")]
    pub count: usize,
    /// Pause between polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_count() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Fetches tasks from a [`TaskSource`], runs them and reports back.
pub struct Worker<S> {
    id: usize,
    router: Arc<FunctionRouter>,
    source: Arc<S>,
    scope: LoggerScope,
    poll_interval: Duration,
}

impl<S: TaskSource> Worker<S> {
    pub fn new(id: usize, router: Arc<FunctionRouter>, source: Arc<S>, config: &WorkerConfig) -> Self {
        Self {
            id,
            router,
            source,
            scope: LoggerScope::get(Some(&format!("worker_{}", id))),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn scope(&self) -> &LoggerScope {
        &self.scope
    }

    /// Context for one task: trace id = task id, payload = task identity.
    pub fn trace_for(&self, task: &Task) -> TraceContext {
        let payload = Payload::new()
            .with("task_id", task.task_id.clone())
            .with("namespace_id", task.namespace_id.clone())
            .with("function", task.function.clone());
        TraceContext::with_scope(Some(&task.task_id), Some(self.scope.clone()), payload)
    }

    /// Fetch one task and process it.
    ///
    /// Returns `Ok(false)` when no task was available. A failed callback
    /// is returned as an error after the task itself has been processed.
    pub async fn run_once(&self) -> BackendResult<bool> {
        let Some(task) = self.source.fetch().await? else {
            self.scope
                .emit(Level::DEBUG, None, &Payload::new(), "no available task, waiting");
            return Ok(false);
        };

        let trace = self.trace_for(&task);
        trace.info("fetch_task", None);

        let processed = self.router.process(task, &trace).await;
        self.source.callback(&processed, &trace).await?;
        Ok(true)
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Failures of a single iteration are logged and the loop continues.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        self.scope
            .emit(Level::INFO, None, &Payload::new(), "worker started");

        loop {
            if let Err(err) = self.run_once().await {
                self.scope.emit(
                    Level::ERROR,
                    None,
                    &Payload::new().with("error", err.to_string()),
                    "worker iteration failed",
                );
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        self.scope
            .emit(Level::INFO, None, &Payload::new(), "worker stopped");
    }
}
