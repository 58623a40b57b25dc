//! Execution capabilities.
//!
//! Two operation shapes consume a [`TraceContext`]:
//!
//! - [`TaskFunction`]: runs one bounded unit of work and returns a single
//!   structured result.
//! - [`Streamable`]: produces an ordered, forward-only sequence of chat
//!   response chunks for one request.
//!
//! Neither trait has a default body, so a component that lacks the
//! capability cannot be used where it is required. Implementations take
//! `&self` and must stay reentrant across concurrent calls with different
//! contexts. Anything they call should receive a context derived from the
//! one they were given.

use async_trait::async_trait;
use futures::{stream, Stream};
use std::pin::Pin;
use wizard_trace::TraceContext;

use crate::entity::{ChatRequest, ChatResponse, Task, TaskOutput};
use crate::error::{Capability, ExecError, ExecResult};

/// Boxed stream of response chunks.
pub type ResponseStream<'a> = Pin<Box<dyn Stream<Item = ExecResult<ChatResponse>> + Send + 'a>>;

/// One-shot task runner.
#[async_trait]
pub trait TaskFunction: Send + Sync {
    /// Execute `task` on behalf of `trace`.
    async fn run(&self, task: &Task, trace: &TraceContext) -> ExecResult<TaskOutput>;
}

/// Streaming responder.
///
/// Every call starts a new, independent sequence. Chunks are observed in
/// the order they are produced and the sequence ends when the underlying
/// generation completes. Failures are yielded in-band as `Err` items.
pub trait Streamable: Send + Sync {
    fn stream(&self, trace: TraceContext, request: ChatRequest) -> ResponseStream<'_>;
}

/// Placeholder for a component that has been declared but not built.
///
/// Both capabilities fail with [`ExecError::Unimplemented`].
#[derive(Debug, Clone)]
pub struct Unimplemented {
    component: String,
}

impl Unimplemented {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    fn error(&self, capability: Capability) -> ExecError {
        ExecError::Unimplemented {
            capability,
            component: self.component.clone(),
        }
    }
}

#[async_trait]
impl TaskFunction for Unimplemented {
    async fn run(&self, _task: &Task, _trace: &TraceContext) -> ExecResult<TaskOutput> {
        Err(self.error(Capability::Run))
    }
}

impl Streamable for Unimplemented {
    fn stream(&self, _trace: TraceContext, _request: ChatRequest) -> ResponseStream<'_> {
        Box::pin(stream::iter([Err(self.error(Capability::Stream))]))
    }
}
