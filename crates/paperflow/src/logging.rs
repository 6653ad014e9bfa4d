//! Subscriber setup for the binary.
//!
//! Pipeline and processor code emit `tracing` spans and events, the worker
//! loop logs through the `log` facade. Both end up in the same `fmt` layer:
//! `log` records are forwarded by [`tracing_log::LogTracer`].

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::LoggingError;

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter.
///
/// # Errors
///
/// Fails when the filter does not parse or a global logger is already set.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let subscriber = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

/// The subscriber [`init`] would install, without installing it.
pub fn build_subscriber(
    config: &LoggingConfig,
) -> Result<impl Subscriber + Send + Sync, LoggingError> {
    let env_filter = create_env_filter(&config.filter)?;
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    Ok(tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter))
}

fn create_env_filter(fallback: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|e| LoggingError::Filter {
            filter: fallback.to_string(),
            message: e.to_string(),
        })
}
