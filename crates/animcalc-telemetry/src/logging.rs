//! Structured logging configuration.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer, Registry,
};

use crate::TelemetryConfig;

/// Builds the level filter. `RUST_LOG` wins over the configured level.
fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Installs the global subscriber: `export` (if any) sits directly on the
/// registry, followed by the level filter and the fmt layer.
pub(crate) fn install<L>(config: &TelemetryConfig, export: Option<L>) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry()
        .with(export)
        .with(build_filter(config));

    if config.json_logs {
        registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init()?;
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}
