//! Execution contracts for the wizard services.
//!
//! This crate defines what it means to run work on behalf of a
//! [`TraceContext`](wizard_trace::TraceContext):
//!
//! - [`TaskFunction`] and [`Streamable`], the two capability traits
//! - [`FunctionRouter`], dispatching tasks to functions by name
//! - [`Worker`], polling a [`TaskSource`] and reporting results
//! - [`drive_stream`], framing a streamable's output for clients
//!
//! # Error taxonomy
//!
//! - `ExecError::Unimplemented`: a placeholder capability was invoked
//!   (programming error, never retried)
//! - `ExecError::Upstream`: a downstream collaborator failed; the error
//!   carries the trace id it happened under

pub mod backend;
pub mod capability;
pub mod entity;
pub mod error;
pub mod router;
pub mod stream;
pub mod worker;

pub use backend::{BackendClient, BackendConfig, BackendError, BackendResult, TaskSource};
pub use capability::{ResponseStream, Streamable, TaskFunction, Unimplemented};
pub use entity::{ChatRequest, ChatResponse, FunctionCall, Task, TaskOutput, ToolCall};
pub use error::{BoxError, Capability, ExecError, ExecResult};
pub use router::FunctionRouter;
pub use stream::{drive_stream, sse_event, STREAM_ERROR_MESSAGE};
pub use worker::{Worker, WorkerConfig};
