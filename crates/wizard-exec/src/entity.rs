//! Task and chat data shapes.
//!
//! Their inner schema (task `input`, request extras, citation records)
//! is owned by the callers; this crate treats those parts as opaque JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured result of one task run.
pub type TaskOutput = Map<String, Value>;

/// A unit of background work fetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "id", alias = "taskId", alias = "task_id")]
    pub task_id: String,
    #[serde(default)]
    pub priority: i32,

    #[serde(default, alias = "namespace_id")]
    pub namespace_id: String,
    #[serde(default, alias = "user_id")]
    pub user_id: String,

    pub function: String,
    #[serde(default)]
    pub input: Map<String, Value>,
    /// Passed through untouched to the callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<TaskOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<Value>,

    #[serde(default = "Utc::now", alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "started_at")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "ended_at")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "canceled_at")]
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(task_id: impl Into<String>, function: impl Into<String>, input: Map<String, Value>) -> Self {
        Self {
            task_id: task_id.into(),
            priority: 0,
            namespace_id: String::new(),
            user_id: String::new(),
            function: function.into(),
            input,
            payload: None,
            output: None,
            exception: None,
            created_at: Utc::now(),
            updated_at: None,
            started_at: None,
            ended_at: None,
            canceled_at: None,
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Whether the task has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Body reported back to the backend when the task finishes.
    pub fn callback_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("id".to_string(), Value::String(self.task_id.clone()));
        if let Some(exception) = &self.exception {
            body.insert("exception".to_string(), exception.clone());
        }
        if let Some(output) = &self.output {
            body.insert("output".to_string(), Value::Object(output.clone()));
        }
        if let Some(ended_at) = &self.ended_at {
            body.insert("endedAt".to_string(), Value::String(ended_at.to_rfc3339()));
        }
        Value::Object(body)
    }
}

/// A chat request handled by a streamable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub query: String,
    /// Caller-owned fields (tools, history, filters, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            query: query.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

/// One chunk of a streamed chat response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum ChatResponse {
    Delta { delta: String },
    ThinkDelta { delta: String },
    #[serde(rename = "openai_message")]
    OpenAiMessage { message: Value },
    CitationList { citation_list: Vec<Value> },
    ToolCall { tool_call: ToolCall },
    /// Emitted by the stream driver when the underlying stream fails.
    Error { message: String },
    /// Emitted by the stream driver after the last chunk.
    Done,
}

impl ChatResponse {
    pub fn delta(delta: impl Into<String>) -> Self {
        ChatResponse::Delta { delta: delta.into() }
    }

    /// Whether this chunk ends a driven stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatResponse::Done)
    }
}
