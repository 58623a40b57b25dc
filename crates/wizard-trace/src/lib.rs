//! Request-scoped trace context for the wizard services.
//!
//! A [`TraceContext`] bundles three things that travel together through
//! every task and stream invocation:
//!
//! - a trace id, supplied by the caller or generated,
//! - a hierarchical [`LoggerScope`] whose dotted name contains the trace id,
//! - a [`Payload`] of inheritable metadata.
//!
//! # Derivation
//!
//! ```text
//! app
//!   └─ req-123                  TraceContext::create(Some("req-123"))
//!       └─ step1   {user}       .derive(Some("step1"), Some(&user))
//!           └─ step2 {user, stage}  .derive(Some("step2"), Some(&stage))
//! ```
//!
//! Deriving never mutates the parent, so one context can be handed to
//! any number of concurrent children without locking.

pub mod context;
pub mod extract;
pub mod payload;
pub mod scope;
pub mod trace_id;

pub use context::TraceContext;
pub use extract::{TraceContextExtractor, TRACE_ID_HEADER};
pub use payload::Payload;
pub use scope::{init_root_scope, root_scope_name, LoggerScope, ScopeRegistry, DEFAULT_ROOT_SCOPE, LOG_TARGET};
