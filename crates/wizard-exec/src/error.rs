//! Error types for task and stream execution.

use std::fmt;
use thiserror::Error;
use wizard_trace::TraceContext;

/// Boxed error raised by a downstream collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which capability an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Run,
    Stream,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Run => f.write_str("run"),
            Capability::Stream => f.write_str("stream"),
        }
    }
}

/// Errors surfaced by task functions and streamables.
#[derive(Error, Debug)]
pub enum ExecError {
    /// A placeholder capability was invoked. This is a development-time
    /// defect and is never retried.
    #[error("`{component}` does not implement {capability}")]
    Unimplemented {
        capability: Capability,
        component: String,
    },

    /// No function is registered under this name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// The task input or request was malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A downstream collaborator failed while working for `trace_id`
    #[error("Upstream failure (trace {trace_id}): {source}")]
    Upstream {
        trace_id: String,
        #[source]
        source: BoxError,
    },
}

impl ExecError {
    /// Wrap a downstream failure, keeping the trace it happened under.
    pub fn upstream(trace: &TraceContext, source: impl Into<BoxError>) -> Self {
        ExecError::Upstream {
            trace_id: trace.trace_id().to_string(),
            source: source.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ExecError::InvalidInput(msg.into())
    }

    /// Whether this error is a programming error rather than a data or
    /// downstream failure.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, ExecError::Unimplemented { .. })
    }

    /// Trace id attached to the error, for upstream failures.
    pub fn trace_id(&self) -> Option<&str> {
        match self {
            ExecError::Upstream { trace_id, .. } => Some(trace_id),
            _ => None,
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecError::Unimplemented { .. } => "programming_error",
            ExecError::UnknownFunction(_) => "unknown_function",
            ExecError::InvalidInput(_) => "invalid_input",
            ExecError::Upstream { .. } => "upstream_failure",
        }
    }

    /// Render the error as the `exception` object recorded on a task.
    pub fn to_exception(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for execution operations
pub type ExecResult<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unimplemented_is_programming_error() {
        let err = ExecError::Unimplemented {
            capability: Capability::Run,
            component: "collect".to_string(),
        };
        assert!(err.is_programming_error());
        assert_eq!(err.kind(), "programming_error");
        assert_eq!(err.to_string(), "`collect` does not implement run");
    }

    #[test]
    fn test_upstream_keeps_trace_id() {
        let trace = TraceContext::create(Some("req-9"));
        let err = ExecError::upstream(&trace, "connection reset");

        assert!(!err.is_programming_error());
        assert_eq!(err.trace_id(), Some("req-9"));
        assert!(err.to_string().contains("req-9"));
        assert!(err.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_to_exception() {
        let err = ExecError::UnknownFunction("nope".to_string());
        let exception = err.to_exception();
        assert_eq!(exception["error"]["kind"], "unknown_function");
        assert_eq!(exception["error"]["message"], "Unknown function: nope");
    }
}
