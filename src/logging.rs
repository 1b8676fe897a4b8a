use error_stack::{Result, ResultExt};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{Logging, LoggingStyle};

#[derive(Debug, Error)]
#[error("Failed to initialize tracing")]
pub struct TracingInitError;

/// Installs the global console subscriber. Logs go to stderr so the
/// process output stays clean for whoever invokes the tool.
pub fn init(config: &Logging) -> Result<(), TracingInitError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(make_env_filter(&config.targets))
        .with_writer(std::io::stderr);

    let result = match config.style {
        LoggingStyle::Compact => builder.compact().try_init(),
        LoggingStyle::Full => builder.try_init(),
        LoggingStyle::Pretty => builder.pretty().try_init(),
        LoggingStyle::JSON => builder.json().try_init(),
    };

    result
        .map_err(|e| error_stack::Report::new(TracingInitError).attach_printable(e.to_string()))
        .attach_printable("already initialized tracing")
}

pub fn init_for_tests() {
    let targets = std::env::var("RUST_LOG").unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(make_env_filter(&targets))
        .with_test_writer()
        .try_init()
        .ok();
}

fn make_env_filter(targets: &str) -> EnvFilter {
    let default_level = if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let targets = if targets.is_empty() {
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default()
    } else {
        targets.to_string()
    };

    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse_lossy(targets)
}
