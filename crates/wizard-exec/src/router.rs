//! Function router
//!
//! Maps a task's `function` name to the [`TaskFunction`] that runs it and
//! records the outcome on the task.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use wizard_trace::{Payload, TraceContext};

use crate::capability::{TaskFunction, Unimplemented};
use crate::entity::{Task, TaskOutput};
use crate::error::{ExecError, ExecResult};

/// Registry of task functions keyed by name.
#[derive(Default, Clone)]
pub struct FunctionRouter {
    functions: HashMap<String, Arc<dyn TaskFunction>>,
}

impl std::fmt::Debug for FunctionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRouter")
            .field("functions", &self.names())
            .finish()
    }
}

impl FunctionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function (builder pattern)
    pub fn with_function<F: TaskFunction + 'static>(mut self, name: impl Into<String>, function: F) -> Self {
        self.register(name, function);
        self
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register<F: TaskFunction + 'static>(&mut self, name: impl Into<String>, function: F) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Reserve a name whose function is not built yet. Routing to it fails
    /// with a programming error instead of `UnknownFunction`.
    pub fn declare(&mut self, name: impl Into<String>) {
        let name = name.into();
        let placeholder = Unimplemented::new(name.clone());
        self.functions.insert(name, Arc::new(placeholder));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run `task` with the function named by `task.function`.
    ///
    /// The function receives a child context scoped under its own name.
    pub async fn route(&self, task: &Task, trace: &TraceContext) -> ExecResult<TaskOutput> {
        let function = self
            .functions
            .get(&task.function)
            .ok_or_else(|| ExecError::UnknownFunction(task.function.clone()))?;

        function.run(task, &trace.child(&task.function)).await
    }

    /// Run `task` and record the outcome on it.
    ///
    /// On success `output` is set, on failure `exception` is. `ended_at`
    /// and `updated_at` are set either way. Errors never escape; they
    /// become part of the returned task.
    pub async fn process(&self, mut task: Task, trace: &TraceContext) -> Task {
        let result = self.route(&task, trace).await;
        let now = Utc::now();
        task.updated_at = Some(now);
        task.ended_at = Some(now);

        let timing = Payload::new()
            .with("created_at", task.created_at.to_rfc3339())
            .with("started_at", task.started_at.map(|t| t.to_rfc3339()))
            .with("ended_at", now.to_rfc3339());

        match result {
            Ok(output) => {
                task.output = Some(output);
                trace.info("task finished", Some(&timing));
            }
            Err(err) => {
                trace.exception(
                    "task failed",
                    &err,
                    Some(&timing.with("error_kind", err.kind())),
                );
                task.exception = Some(err.to_exception());
            }
        }

        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct Upper;

    #[async_trait]
    impl TaskFunction for Upper {
        async fn run(&self, task: &Task, trace: &TraceContext) -> ExecResult<TaskOutput> {
            let text = task
                .input
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ExecError::invalid_input("text is required"))?;
            let mut output = Map::new();
            output.insert("text".into(), json!(text.to_uppercase()));
            output.insert("scope".into(), json!(trace.scope().name()));
            Ok(output)
        }
    }

    fn task(function: &str, input: serde_json::Value) -> Task {
        Task::new("t-1", function, input.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn test_route_dispatches_by_name() {
        let router = FunctionRouter::new().with_function("upper", Upper);
        let trace = TraceContext::create(Some("route-1"));

        let output = router
            .route(&task("upper", json!({"text": "abc"})), &trace)
            .await
            .unwrap();

        assert_eq!(output["text"], "ABC");
        assert!(output["scope"].as_str().unwrap().ends_with("route-1.upper"));
    }

    #[tokio::test]
    async fn test_route_unknown_function() {
        let router = FunctionRouter::new();
        let err = router
            .route(&task("missing", json!({})), &TraceContext::create(None))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::UnknownFunction(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_declared_function_is_programming_error() {
        let mut router = FunctionRouter::new();
        router.declare("collect");
        assert!(router.contains("collect"));

        let err = router
            .route(&task("collect", json!({})), &TraceContext::create(None))
            .await
            .unwrap_err();
        assert!(err.is_programming_error());
    }

    #[tokio::test]
    async fn test_process_records_output() {
        let router = FunctionRouter::new().with_function("upper", Upper);
        let done = router
            .process(task("upper", json!({"text": "x"})), &TraceContext::create(None))
            .await;

        assert!(done.is_finished());
        assert_eq!(done.output.unwrap()["text"], "X");
        assert!(done.exception.is_none());
    }

    #[tokio::test]
    async fn test_process_records_exception() {
        let router = FunctionRouter::new().with_function("upper", Upper);
        let done = router
            .process(task("upper", json!({})), &TraceContext::create(None))
            .await;

        assert!(done.is_finished());
        assert!(done.output.is_none());
        assert_eq!(done.exception.unwrap()["error"]["kind"], "invalid_input");
    }

    #[test]
    fn test_names_sorted() {
        let mut router = FunctionRouter::new().with_function("upper", Upper);
        router.declare("collect");
        assert_eq!(router.names(), vec!["collect", "upper"]);
    }
}
