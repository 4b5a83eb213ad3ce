//! Tracing subscriber assembly: fmt layer, env filter, and optional OTLP export.

use anyhow::Result;
use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use std::{env::var, time::Duration};
use tonic::transport::ClientTlsConfig;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Initialize the global tracing subscriber.
///
/// Spans are exported over OTLP/gRPC when `OTEL_EXPORTER_OTLP_ENDPOINT` is
/// set; the fmt layer and `RUST_LOG` filtering are always active.
///
/// # Errors
/// Returns an error if the exporter cannot be built or a global subscriber is
/// already installed.
pub fn init(verbosity_level: tracing::Level) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    // RUST_LOG=
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy();

    let telemetry = match var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => {
            let mut builder = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(&endpoint)
                .with_timeout(Duration::from_secs(3));

            // TLS (https) support
            if let Some(host) = endpoint
                .strip_prefix("https://")
                .and_then(|s| s.split('/').next())
                .and_then(|h| h.split(':').next())
            {
                let tls = ClientTlsConfig::new()
                    .domain_name(host.to_string())
                    .with_native_roots();
                builder = builder.with_tls_config(tls);
            }

            let exporter = builder.build()?;

            let provider = sdktrace::TracerProvider::builder()
                .with_batch_exporter(exporter, runtime::Tokio)
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ]))
                .build();

            Some(OpenTelemetryLayer::new(
                provider.tracer(env!("CARGO_PKG_NAME")),
            ))
        }
        Err(_) => None,
    };

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(telemetry)
        .with(env_filter);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
