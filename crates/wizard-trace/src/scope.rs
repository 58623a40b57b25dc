//! Hierarchical logger scopes.
//!
//! Scopes are named by dotted paths (`app.worker_0.<trace_id>.collect`).
//! Every path is registered once in a process-wide [`ScopeRegistry`];
//! asking for the same path again returns the same shared node, so
//! concurrent acquisition of one name never duplicates or fails.
//!
//! The registry holds nodes weakly. Once the last handle to a path is
//! dropped its entry is removed, so per-request scopes do not outlive
//! the request.
//!
//! Log records are emitted through `tracing` with target `wizard` and a
//! `logger` field holding the fully-qualified scope name.

use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::Level;

use crate::payload::Payload;

/// Name of the application root scope unless overridden at startup.
pub const DEFAULT_ROOT_SCOPE: &str = "app";

/// Target used for every record emitted through a scope.
pub const LOG_TARGET: &str = "wizard";

static REGISTRY: OnceLock<ScopeRegistry> = OnceLock::new();
static ROOT_NAME: OnceLock<String> = OnceLock::new();

/// Set the application root scope name.
///
/// Only the first call has an effect. Returns `false` if a name was
/// already set (or the default was already used).
pub fn init_root_scope(name: impl Into<String>) -> bool {
    ROOT_NAME.set(name.into()).is_ok()
}

/// The application root scope name.
pub fn root_scope_name() -> &'static str {
    ROOT_NAME.get_or_init(|| DEFAULT_ROOT_SCOPE.to_string())
}

/// A registered scope. One live node exists per dotted path.
#[derive(Debug)]
struct ScopeNode {
    name: String,
}

impl Drop for ScopeNode {
    fn drop(&mut self) {
        // a concurrent acquire may already have replaced the entry
        ScopeRegistry::global()
            .nodes
            .remove_if(&self.name, |_, node| node.strong_count() == 0);
    }
}

/// Process-wide get-or-create registry of scope nodes.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    nodes: DashMap<String, Weak<ScopeNode>>,
}

impl ScopeRegistry {
    /// The registry shared by every [`LoggerScope`] in the process.
    pub fn global() -> &'static ScopeRegistry {
        REGISTRY.get_or_init(ScopeRegistry::default)
    }

    fn acquire(&self, path: &str) -> Arc<ScopeNode> {
        if let Some(node) = self.nodes.get(path).and_then(|entry| entry.upgrade()) {
            return node;
        }

        let mut entry = self.nodes.entry(path.to_string()).or_default();
        if let Some(node) = entry.upgrade() {
            return node;
        }
        let node = Arc::new(ScopeNode {
            name: path.to_string(),
        });
        *entry = Arc::downgrade(&node);
        node
    }

    /// Whether a live scope with this dotted path is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.nodes
            .get(path)
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    /// Number of registered scopes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Handle to a registered scope.
///
/// Handles are cheap to clone and never change. Besides the node, a
/// handle remembers the trace id it was anchored to, if any. Children
/// inherit the anchor, which lets [`TraceContext`] tell structurally
/// whether a scope already belongs to a trace.
///
/// [`TraceContext`]: crate::TraceContext
#[derive(Clone)]
pub struct LoggerScope {
    node: Arc<ScopeNode>,
    anchor: Option<Arc<str>>,
}

impl LoggerScope {
    /// Acquire a top-level scope.
    pub fn root(name: &str) -> Self {
        Self {
            node: ScopeRegistry::global().acquire(name),
            anchor: None,
        }
    }

    /// The application root scope.
    pub fn app() -> Self {
        Self::root(root_scope_name())
    }

    /// Look up a scope below the application root.
    ///
    /// `None`, `"root"` and the root's own name return the root itself.
    pub fn get(name: Option<&str>) -> Self {
        let root = Self::app();
        match name {
            Some(n) if !n.is_empty() && n != "root" && n != root_scope_name() => root.child(n),
            _ => root,
        }
    }

    /// Acquire the child scope `name`, inheriting this handle's anchor.
    pub fn child(&self, name: &str) -> Self {
        let path = format!("{}.{}", self.node.name, name);
        Self {
            node: ScopeRegistry::global().acquire(&path),
            anchor: self.anchor.clone(),
        }
    }

    /// Acquire the child scope named after `trace_id` and anchor it there.
    pub(crate) fn anchored(&self, trace_id: &Arc<str>) -> Self {
        let mut child = self.child(trace_id);
        child.anchor = Some(Arc::clone(trace_id));
        child
    }

    /// Fully-qualified dotted name.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Name split into its path segments.
    pub fn segments(&self) -> Vec<&str> {
        self.node.name.split('.').collect()
    }

    /// Trace id this scope was anchored to, if any.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Whether both handles refer to the same registered node.
    pub fn same_scope(&self, other: &LoggerScope) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Emit one record through this scope.
    pub fn emit(&self, level: Level, trace_id: Option<&str>, payload: &Payload, message: &str) {
        let logger = self.name();
        let trace_id = trace_id.unwrap_or_default();
        let payload = payload.to_json();

        macro_rules! emit_at {
            ($lvl:expr) => {
                tracing::event!(
                    target: LOG_TARGET,
                    $lvl,
                    logger = %logger,
                    trace_id = %trace_id,
                    payload = %payload,
                    "{}",
                    message
                )
            };
        }

        match level {
            Level::TRACE => emit_at!(Level::TRACE),
            Level::DEBUG => emit_at!(Level::DEBUG),
            Level::INFO => emit_at!(Level::INFO),
            Level::WARN => emit_at!(Level::WARN),
            Level::ERROR => emit_at!(Level::ERROR),
        }
    }
}

impl fmt::Debug for LoggerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerScope")
            .field("name", &self.node.name)
            .field("anchor", &self.anchor)
            .finish()
    }
}

impl fmt::Display for LoggerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_names_are_dotted() {
        let scope = LoggerScope::root("scope-test").child("a").child("b");
        assert_eq!(scope.name(), "scope-test.a.b");
        assert_eq!(scope.segments(), vec!["scope-test", "a", "b"]);
    }

    #[test]
    fn test_acquire_is_idempotent() {
        let first = LoggerScope::root("idem").child("x");
        let second = LoggerScope::root("idem").child("x");
        assert!(first.same_scope(&second));
        assert!(ScopeRegistry::global().contains("idem.x"));
    }

    #[test]
    fn test_concurrent_acquire_yields_one_node() {
        let handles: Vec<_> = (0..16)
            .map(|_| std::thread::spawn(|| LoggerScope::root("race").child("same")))
            .collect();
        let scopes: Vec<LoggerScope> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for scope in &scopes[1..] {
            assert!(scope.same_scope(&scopes[0]));
        }
    }

    #[test]
    fn test_get_resolves_below_root() {
        assert_eq!(LoggerScope::get(None).name(), root_scope_name());
        assert_eq!(LoggerScope::get(Some("root")).name(), root_scope_name());
        assert_eq!(LoggerScope::get(Some(root_scope_name())).name(), root_scope_name());
        assert_eq!(
            LoggerScope::get(Some("worker_0")).name(),
            format!("{}.worker_0", root_scope_name())
        );
    }

    #[test]
    fn test_anchor_is_inherited() {
        let trace_id: Arc<str> = Arc::from("t-1");
        let scope = LoggerScope::root("anchor-test").anchored(&trace_id);
        assert_eq!(scope.anchor(), Some("t-1"));
        assert_eq!(scope.child("step").anchor(), Some("t-1"));
        assert_eq!(LoggerScope::root("anchor-test").anchor(), None);
    }

    #[test]
    fn test_dropped_scope_is_released() {
        let scope = LoggerScope::root("release-test").child("gone");
        assert!(ScopeRegistry::global().contains("release-test.gone"));

        drop(scope);
        assert!(!ScopeRegistry::global().contains("release-test.gone"));
        assert!(ScopeRegistry::global().nodes.get("release-test.gone").is_none());
    }

    #[test]
    fn test_reacquire_after_release() {
        let first = LoggerScope::root("reacquire-test");
        drop(first);

        let second = LoggerScope::root("reacquire-test");
        let third = LoggerScope::root("reacquire-test");
        assert!(second.same_scope(&third));
        assert_eq!(second.name(), "reacquire-test");
    }

    #[test]
    fn test_parent_unchanged_by_child() {
        let parent = LoggerScope::root("parent-test");
        let _child = parent.child("c");
        assert_eq!(parent.name(), "parent-test");
        assert!(parent.anchor().is_none());
    }
}
