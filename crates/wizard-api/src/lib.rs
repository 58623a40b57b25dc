//! # Wizard API
//!
//! HTTP surface and task worker for the wizard. Requests carry their
//! trace id in `X-Trace-ID`; workers use the task id. Either way every
//! log record of one unit of work shares the same trace id.

pub mod config;
pub mod echo;
pub mod handler;
pub mod logging;

use std::sync::Arc;
use wizard_exec::FunctionRouter;

pub use config::{Config, ConfigError};
pub use handler::{create_router, AppState};

/// Function router with the built-in functions registered.
pub fn default_functions() -> FunctionRouter {
    FunctionRouter::new().with_function("echo", echo::EchoFunction)
}

/// State backed by the built-in components.
pub fn default_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(default_functions()),
        Arc::new(echo::EchoStream),
    ))
}
