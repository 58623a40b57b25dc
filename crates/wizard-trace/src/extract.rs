//! Axum extractor for the trace context.
//!
//! Reads `X-Trace-ID` from request headers. A missing or empty value
//! yields a freshly generated trace id. Any other value is kept, with
//! bytes that are not valid UTF-8 replaced by U+FFFD; the extractor
//! never rejects a request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::context::TraceContext;

/// Header carrying the caller-supplied trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Axum extractor that builds a [`TraceContext`] from request headers.
pub struct TraceContextExtractor(pub TraceContext);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TraceContextExtractor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let trace_id = parts
            .headers
            .get(TRACE_ID_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));

        Ok(Self(TraceContext::create(trace_id.as_deref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace_id::TRACE_ID_LEN;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> TraceContext {
        let (mut parts, _) = request.into_parts();
        let TraceContextExtractor(ctx) = TraceContextExtractor::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_header_is_used_verbatim() {
        let request = Request::builder()
            .header("X-Trace-ID", "req-123")
            .body(())
            .unwrap();
        let ctx = extract(request).await;
        assert_eq!(ctx.trace_id(), "req-123");
    }

    #[tokio::test]
    async fn test_non_ascii_header_is_kept() {
        let request = Request::builder()
            .header(TRACE_ID_HEADER, HeaderValue::from_bytes("req-café".as_bytes()).unwrap())
            .body(())
            .unwrap();
        let ctx = extract(request).await;
        assert_eq!(ctx.trace_id(), "req-café");
    }

    #[tokio::test]
    async fn test_invalid_utf8_header_is_decoded_lossily() {
        let request = Request::builder()
            .header(TRACE_ID_HEADER, HeaderValue::from_bytes(b"req-\xe9").unwrap())
            .body(())
            .unwrap();
        let ctx = extract(request).await;
        assert_eq!(ctx.trace_id(), "req-\u{FFFD}");
    }

    #[tokio::test]
    async fn test_missing_header_generates_id() {
        let ctx = extract(Request::builder().body(()).unwrap()).await;
        assert_eq!(ctx.trace_id().len(), TRACE_ID_LEN);
    }

    #[tokio::test]
    async fn test_empty_header_generates_id() {
        let request = Request::builder()
            .header(TRACE_ID_HEADER, "")
            .body(())
            .unwrap();
        let ctx = extract(request).await;
        assert_eq!(ctx.trace_id().len(), TRACE_ID_LEN);
    }
}
