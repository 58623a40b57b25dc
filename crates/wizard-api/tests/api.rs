//! HTTP surface tests driven through `tower::ServiceExt::oneshot`

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;
use wizard_api::{create_router, default_functions, default_state, AppState, Config};
use wizard_exec::{ChatResponse, Unimplemented};
use wizard_trace::TRACE_ID_HEADER;

fn app() -> Router {
    create_router(default_state())
}

fn post_json(uri: &str, body: Value, trace_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(trace_id) = trace_id {
        builder = builder.header(TRACE_ID_HEADER, trace_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Parse an SSE body into chunks.
fn sse_chunks(body: &str) -> Vec<ChatResponse> {
    body.split("\n\n")
        .filter(|event| !event.is_empty())
        .map(|event| {
            let data = event.strip_prefix("data: ").expect("data prefix");
            serde_json::from_str(data).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_run_task_echo_propagates_trace_id() {
    let task = json!({"id": "t-1", "function": "echo", "input": {"text": "hi"}});
    let response = app()
        .oneshot(post_json("/api/v1/wizard/tasks/run", task, Some("caller-trace")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[TRACE_ID_HEADER], "caller-trace");

    let body = body_json(response).await;
    assert_eq!(body["id"], "t-1");
    assert_eq!(body["output"], json!({"text": "hi"}));
    assert!(body.get("exception").map_or(true, Value::is_null));
    assert!(body["endedAt"].is_string());
}

#[tokio::test]
async fn test_run_task_generates_trace_id() {
    let task = json!({"id": "t-2", "function": "echo", "input": {}});
    let response = app()
        .oneshot(post_json("/api/v1/wizard/tasks/run", task, None))
        .await
        .unwrap();

    let trace_id = response.headers()[TRACE_ID_HEADER].to_str().unwrap();
    assert_eq!(trace_id.len(), 22);
}

#[tokio::test]
async fn test_run_task_unknown_function_sets_exception() {
    let task = json!({"id": "t-3", "function": "nope", "input": {}});
    let response = app()
        .oneshot(post_json("/api/v1/wizard/tasks/run", task, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["exception"]["error"]["kind"], "unknown_function");
    assert!(body.get("output").map_or(true, Value::is_null));
}

#[tokio::test]
async fn test_stream_echo_sse() {
    let request = json!({"session_id": "s-1", "query": "hello world"});
    let response = app()
        .oneshot(post_json("/api/v1/grimoire/stream", request, Some("stream-trace")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[TRACE_ID_HEADER], "stream-trace");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let chunks = sse_chunks(std::str::from_utf8(&bytes).unwrap());
    assert_eq!(
        chunks,
        vec![
            ChatResponse::delta("hello "),
            ChatResponse::delta("world"),
            ChatResponse::Done,
        ]
    );
}

#[tokio::test]
async fn test_stream_placeholder_reports_unknown_error() {
    let state = Arc::new(AppState::new(
        Arc::new(default_functions()),
        Arc::new(Unimplemented::new("grimoire")),
    ));
    let request = json!({"session_id": "s-2", "query": "anything"});
    let response = create_router(state)
        .oneshot(post_json("/api/v1/grimoire/stream", request, None))
        .await
        .unwrap();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let chunks = sse_chunks(std::str::from_utf8(&bytes).unwrap());
    assert_eq!(
        chunks,
        vec![
            ChatResponse::Error {
                message: "Unknown error".to_string()
            },
            ChatResponse::Done,
        ]
    );
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "env: prod\nserver:\n  port: 8123\ntrace:\n  root_scope: wizard").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.is_production());
    assert_eq!(config.server.port, 8123);
    assert_eq!(config.trace.root_scope, "wizard");
}
