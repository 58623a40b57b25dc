//! Request-scoped trace context.

use std::sync::Arc;
use tracing::Level;

use crate::payload::Payload;
use crate::scope::{LoggerScope, LOG_TARGET};
use crate::trace_id;

/// Trace identity, logger scope and payload for one logical request.
///
/// A context is created once at the boundary (HTTP request, background
/// task) and passed down explicitly. Nested components call
/// [`derive`](Self::derive) to get a distinguishable logger scope or
/// extra metadata; the trace id never changes and the parent is never
/// modified.
#[derive(Debug, Clone)]
pub struct TraceContext {
    trace_id: Arc<str>,
    scope: LoggerScope,
    payload: Payload,
}

impl TraceContext {
    /// Create a root context below the application scope.
    ///
    /// An absent or empty `trace_id` is replaced by a generated one.
    pub fn create(trace_id: Option<&str>) -> Self {
        Self::with_scope(trace_id, None, Payload::new())
    }

    /// Create a context below an arbitrary scope.
    ///
    /// The scope descends into a child named after the trace id unless it
    /// is already anchored to that same trace id, so rebuilding a context
    /// from an existing one never nests `<trace_id>.<trace_id>`.
    pub fn with_scope(trace_id: Option<&str>, scope: Option<LoggerScope>, payload: Payload) -> Self {
        let trace_id: Arc<str> = Arc::from(trace_id::resolve(trace_id));
        let scope = scope.unwrap_or_else(LoggerScope::app);
        let scope = if scope.anchor() == Some(&*trace_id) {
            scope
        } else {
            scope.anchored(&trace_id)
        };

        Self {
            trace_id,
            scope,
            payload,
        }
    }

    /// Derive a child context.
    ///
    /// The child keeps the trace id. Its scope is a child named
    /// `scope_name`, or the current scope when `None` or when the name is
    /// the trace id itself (the trace segment only ever appears once).
    /// Its payload is the current payload overlaid with `extra`.
    pub fn derive(&self, scope_name: Option<&str>, extra: Option<&Payload>) -> Self {
        let scope = match scope_name {
            Some(name) if name != &*self.trace_id => self.scope.child(name),
            _ => self.scope.clone(),
        };
        let payload = match extra {
            Some(extra) => self.payload.merge(extra),
            None => self.payload.clone(),
        };

        Self {
            trace_id: Arc::clone(&self.trace_id),
            scope,
            payload,
        }
    }

    /// Derive a child with a nested scope and the same payload.
    pub fn child(&self, name: &str) -> Self {
        self.derive(Some(name), None)
    }

    /// Derive a context in the same scope with extra payload.
    pub fn bind(&self, extra: Payload) -> Self {
        self.derive(None, Some(&extra))
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn scope(&self) -> &LoggerScope {
        &self.scope
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// A `tracing` span carrying this context's identity, for
    /// instrumenting futures that run on its behalf.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            target: LOG_TARGET,
            "trace",
            trace_id = %self.trace_id,
            logger = %self.scope.name()
        )
    }

    /// Emit a record through this context's scope at `level`.
    ///
    /// The record's payload is the context payload overlaid with `fields`;
    /// the context itself is left unchanged.
    pub fn log(&self, level: Level, message: &str, fields: Option<&Payload>) {
        let trace_id = Some(self.trace_id());
        match fields {
            Some(fields) => {
                self.scope
                    .emit(level, trace_id, &self.payload.merge(fields), message)
            }
            None => self.scope.emit(level, trace_id, &self.payload, message),
        }
    }

    pub fn debug(&self, message: &str, fields: Option<&Payload>) {
        self.log(Level::DEBUG, message, fields);
    }

    pub fn info(&self, message: &str, fields: Option<&Payload>) {
        self.log(Level::INFO, message, fields);
    }

    pub fn warn(&self, message: &str, fields: Option<&Payload>) {
        self.log(Level::WARN, message, fields);
    }

    pub fn error(&self, message: &str, fields: Option<&Payload>) {
        self.log(Level::ERROR, message, fields);
    }

    /// Log `error` at error level with its source chain.
    ///
    /// Adds `error` (the top-level message) and `error_chain` (messages of
    /// every source, outermost first) on top of `fields`.
    pub fn exception(
        &self,
        message: &str,
        error: &(dyn std::error::Error + 'static),
        fields: Option<&Payload>,
    ) {
        let chain: Vec<String> = std::iter::successors(error.source(), |e| e.source())
            .map(|e| e.to_string())
            .collect();
        let mut record = fields.cloned().unwrap_or_default();
        record.insert("error", error.to_string());
        record.insert("error_chain", chain);
        self.log(Level::ERROR, message, Some(&record));
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::create(None)
    }
}
