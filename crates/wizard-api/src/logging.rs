//! Logging initialisation
//!
//! Records from every logger scope go through `tracing`. `RUST_LOG`
//! takes precedence over the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter directive used when neither `RUST_LOG` nor the config set one.
pub fn default_level(production: bool) -> &'static str {
    if production {
        "info"
    } else {
        "debug"
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig, production: bool) -> anyhow::Result<()> {
    let level = config
        .level
        .clone()
        .unwrap_or_else(|| default_level(production).to_string());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    let json_layer = config.json.then(|| fmt::layer().json().with_current_span(false));
    let text_layer = (!config.json).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    Ok(())
}
