//! HTTP handlers
//!
//! Every handler receives its [`TraceContext`] from the `X-Trace-ID`
//! header (generated when absent) and echoes the trace id back in the
//! response headers.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use wizard_exec::{drive_stream, sse_event, ChatRequest, FunctionRouter, Streamable, Task};
use wizard_trace::{Payload, TraceContext, TraceContextExtractor, TRACE_ID_HEADER};

/// Application state
pub struct AppState {
    pub functions: Arc<FunctionRouter>,
    pub streamable: Arc<dyn Streamable>,
}

impl AppState {
    pub fn new(functions: Arc<FunctionRouter>, streamable: Arc<dyn Streamable>) -> Self {
        Self {
            functions,
            streamable,
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/wizard/tasks/run", post(run_task))
        .route("/api/v1/grimoire/stream", post(stream_chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run one task synchronously and return it with `output` or `exception` set
async fn run_task(
    State(state): State<Arc<AppState>>,
    TraceContextExtractor(trace): TraceContextExtractor,
    Json(task): Json<Task>,
) -> Response {
    let trace = trace.bind(
        Payload::new()
            .with("task_id", task.task_id.clone())
            .with("function", task.function.clone()),
    );
    trace.info("run task", None);

    let processed = state.functions.process(task, &trace).await;
    (trace_header(&trace), Json(processed)).into_response()
}

/// Stream a chat response as server-sent events
async fn stream_chat(
    State(state): State<Arc<AppState>>,
    TraceContextExtractor(trace): TraceContextExtractor,
    Json(request): Json<ChatRequest>,
) -> Response {
    let trace = trace.bind(Payload::new().with("session_id", request.session_id.clone()));
    trace.info("stream chat", None);

    let events = drive_stream(Arc::clone(&state.streamable), trace.clone(), request)
        .map(|chunk| sse_event(&chunk));

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        trace_header(&trace),
        axum::body::Body::from_stream(events),
    )
        .into_response()
}

fn trace_header(trace: &TraceContext) -> [(&'static str, String); 1] {
    [(TRACE_ID_HEADER, trace.trace_id().to_string())]
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
