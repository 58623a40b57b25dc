//! Built-in echo components.
//!
//! `echo` returns its task input unchanged; the echo stream replays the
//! query back as word deltas. Both exist so a fresh deployment can be
//! exercised end to end.

use async_trait::async_trait;
use wizard_exec::{
    ChatRequest, ChatResponse, ExecError, ExecResult, ResponseStream, Streamable, Task,
    TaskFunction, TaskOutput,
};
use wizard_trace::{Payload, TraceContext};

pub struct EchoFunction;

#[async_trait]
impl TaskFunction for EchoFunction {
    async fn run(&self, task: &Task, trace: &TraceContext) -> ExecResult<TaskOutput> {
        trace.debug("echo", Some(&Payload::new().with("fields", task.input.len())));
        Ok(task.input.clone())
    }
}

pub struct EchoStream;

impl Streamable for EchoStream {
    fn stream(&self, trace: TraceContext, request: ChatRequest) -> ResponseStream<'_> {
        Box::pin(async_stream::stream! {
            let trace = trace.derive(
                Some("echo"),
                Some(&Payload::new().with("session_id", request.session_id.clone())),
            );
            trace.debug("stream started", None);

            let mut count = 0usize;
            for word in request.query.split_inclusive(char::is_whitespace) {
                count += 1;
                yield Ok::<_, ExecError>(ChatResponse::delta(word));
            }

            trace.debug("stream finished", Some(&Payload::new().with("chunks", count)));
        })
    }
}
