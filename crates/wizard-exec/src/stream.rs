//! Stream driver
//!
//! Adapts a [`Streamable`] for delivery to a client: chunks pass through
//! in order, the first failure becomes a single `error` chunk, and the
//! sequence always ends with `done`.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use wizard_trace::{Payload, TraceContext};

use crate::capability::Streamable;
use crate::entity::{ChatRequest, ChatResponse};

/// Message sent to clients in place of the internal error.
pub const STREAM_ERROR_MESSAGE: &str = "Unknown error";

/// Drive `streamable` for one request.
///
/// Failures are logged through `trace` with the error kind and never
/// reach the client verbatim.
pub fn drive_stream<S>(
    streamable: Arc<S>,
    trace: TraceContext,
    request: ChatRequest,
) -> impl Stream<Item = ChatResponse> + Send + 'static
where
    S: Streamable + ?Sized + 'static,
{
    async_stream::stream! {
        let mut chunks = streamable.stream(trace.clone(), request);
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => yield chunk,
                Err(err) => {
                    trace.exception(
                        "stream failed",
                        &err,
                        Some(&Payload::new().with("error_kind", err.kind())),
                    );
                    yield ChatResponse::Error {
                        message: STREAM_ERROR_MESSAGE.to_string(),
                    };
                    break;
                }
            }
        }
        yield ChatResponse::Done;
    }
}

/// Render a chunk as one server-sent event.
pub fn sse_event(chunk: &ChatResponse) -> serde_json::Result<String> {
    Ok(format!("data: {}\n\n", serde_json::to_string(chunk)?))
}
