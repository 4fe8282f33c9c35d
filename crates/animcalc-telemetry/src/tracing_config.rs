//! Distributed tracing configuration.

use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::TelemetryConfig;

/// Boxed error returned by telemetry initialization.
pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Guard for the tracing provider that shuts down on drop.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl TracingGuard {
    /// Returns `true` if spans are being exported.
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!("Error shutting down tracer provider: {:?}", e);
            }
        }
    }
}

/// Initializes logging and, when an OTLP endpoint is configured, span export.
///
/// The span export layer and the fmt layer are installed in one registry, so
/// every `tracing` span the service opens is both logged and exported.
/// Without an endpoint, or without the `otlp` feature, nothing is exported.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built or a global
/// subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TracingGuard, InitError> {
    let provider = build_provider(config)?;

    #[cfg(feature = "otlp")]
    crate::logging::install(config, provider.as_ref().map(export_layer))?;

    #[cfg(not(feature = "otlp"))]
    crate::logging::install(config, None::<tracing_subscriber::layer::Identity>)?;

    match (&config.otlp_endpoint, &provider) {
        (Some(endpoint), Some(_)) => {
            tracing::info!(
                service = %config.service_name,
                endpoint = %endpoint,
                "OTLP tracing initialized"
            );
        }
        (Some(_), None) => {
            tracing::warn!("OTLP feature not enabled, tracing will be local only");
        }
        (None, _) => {
            tracing::debug!("No OTLP endpoint configured, using local tracing only");
        }
    }

    Ok(TracingGuard { provider })
}

/// Builds the tracer provider for the configured endpoint, if any.
#[cfg(feature = "otlp")]
fn build_provider(config: &TelemetryConfig) -> Result<Option<SdkTracerProvider>, InitError> {
    use std::time::Duration;

    use opentelemetry::{global, KeyValue};
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::{
        trace::{RandomIdGenerator, Sampler},
        Resource,
    };

    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok(None);
    };

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(Duration::from_secs(10))
        .build()?;

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());

    Ok(Some(provider))
}

#[cfg(not(feature = "otlp"))]
#[allow(clippy::unnecessary_wraps)]
fn build_provider(_config: &TelemetryConfig) -> Result<Option<SdkTracerProvider>, InitError> {
    Ok(None)
}

/// Layer that turns `tracing` spans into OpenTelemetry spans on `provider`.
#[cfg(feature = "otlp")]
fn export_layer(
    provider: &SdkTracerProvider,
) -> tracing_opentelemetry::OpenTelemetryLayer<
    tracing_subscriber::Registry,
    opentelemetry_sdk::trace::Tracer,
> {
    use opentelemetry::trace::TracerProvider as _;

    tracing_opentelemetry::OpenTelemetryLayer::new(provider.tracer("animcalc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoint_builds_no_provider() {
        let provider = build_provider(&TelemetryConfig::new("animcalc")).unwrap();
        assert!(provider.is_none());
        assert!(!TracingGuard { provider }.is_exporting());
    }

    #[cfg(not(feature = "otlp"))]
    #[test]
    fn test_endpoint_without_feature_builds_no_provider() {
        let config = TelemetryConfig::new("animcalc").with_otlp("http://localhost:4317");
        assert!(build_provider(&config).unwrap().is_none());
    }

    #[cfg(feature = "otlp")]
    #[test]
    fn test_export_layer_receives_spans() {
        use opentelemetry_sdk::trace::InMemorySpanExporter;
        use tracing_subscriber::layer::SubscriberExt;

        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();

        let subscriber = tracing_subscriber::registry().with(Some(export_layer(&provider)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info_span!("calculate", operator = "+").in_scope(|| {
                tracing::debug!("inside");
            });
        });

        provider.force_flush().unwrap();
        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "calculate");

        let guard = TracingGuard {
            provider: Some(provider),
        };
        assert!(guard.is_exporting());
    }
}
