//! Backend task API client
//!
//! Fetches pending tasks and reports finished ones:
//!
//! - `GET  {base_url}/internal/api/v1/tasks/fetch` (204 when idle)
//! - `POST {base_url}/internal/api/v1/tasks/callback`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use wizard_trace::{Payload, TraceContext, TRACE_ID_HEADER};

use crate::entity::Task;

/// Backend client errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid task payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Where a worker gets tasks from and reports them to.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch the next pending task, if any.
    async fn fetch(&self) -> BackendResult<Option<Task>>;

    /// Report a finished task.
    async fn callback(&self, task: &Task, trace: &TraceContext) -> BackendResult<()>;
}

/// HTTP implementation of [`TaskSource`]
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// The backend nests owner ids as `{"user": {"id": ..}, "namespace": {"id": ..}}`.
fn decode_task(mut value: Value) -> BackendResult<Task> {
    if let Value::Object(map) = &mut value {
        for (nested, flat) in [("user", "userId"), ("namespace", "namespaceId")] {
            let id = map.get(nested).and_then(|v| v.get("id")).cloned();
            if let Some(id) = id {
                map.insert(flat.to_string(), id);
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl TaskSource for BackendClient {
    async fn fetch(&self) -> BackendResult<Option<Task>> {
        let response = self
            .client
            .get(self.url("/internal/api/v1/tasks/fetch"))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        if body.is_null() {
            return Ok(None);
        }
        decode_task(body).map(Some)
    }

    async fn callback(&self, task: &Task, trace: &TraceContext) -> BackendResult<()> {
        let response = self
            .client
            .post(self.url("/internal/api/v1/tasks/callback"))
            .header(TRACE_ID_HEADER, trace.trace_id())
            .json(&task.callback_body())
            .send()
            .await?;

        let status = response.status();
        let fields = Payload::new().with("status_code", status.as_u16());
        if status.is_success() {
            trace.debug("callback delivered", Some(&fields));
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            trace.error(
                "callback rejected",
                Some(&fields.with("response", body.clone())),
            );
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_flattens_owner_ids() {
        let task = decode_task(json!({
            "id": "t-1",
            "function": "collect",
            "user": {"id": "u-1"},
            "namespace": {"id": "ns-1"},
            "input": {}
        }))
        .unwrap();

        assert_eq!(task.user_id, "u-1");
        assert_eq!(task.namespace_id, "ns-1");
    }

    #[test]
    fn test_decode_rejects_missing_function() {
        assert!(matches!(
            decode_task(json!({"id": "t-1"})),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = BackendClient::new(&BackendConfig {
            base_url: "http://backend:8000/".to_string(),
        });
        assert_eq!(client.url("/x"), "http://backend:8000/x");
    }
}
