//! Logging to stderr and optional OTLP trace export.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "vstat";

/// Flushes exported spans when dropped.
pub struct TelemetryGuard {
	tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
	fn drop(&mut self) {
		if let Some(provider) = self.tracer_provider.take() {
			if let Err(e) = provider.shutdown() {
				eprintln!("Failed to shutdown tracer provider: {e}");
			}
		}
	}
}

/// Level filter: `--log-level`, else `RUST_LOG`, else `warn`.
fn filter(log_level: Option<Level>) -> EnvFilter {
	match log_level {
		Some(level) => EnvFilter::new(level.as_str()),
		None => EnvFilter::builder()
			.with_default_directive(Level::WARN.into())
			.from_env_lossy(),
	}
}

fn otel_export_enabled() -> bool {
	std::env::var_os(opentelemetry_otlp::OTEL_EXPORTER_OTLP_ENDPOINT).is_some()
		|| std::env::var_os(opentelemetry_otlp::OTEL_EXPORTER_OTLP_TRACES_ENDPOINT).is_some()
}

/// Install the global subscriber.
///
/// Logs go to stderr, pretty on a terminal and JSON otherwise; stdout only
/// carries the report. Spans are exported over OTLP/gRPC when an OTLP
/// endpoint is configured, with `service.name` defaulting to `vstat`.
///
/// Must run inside a tokio runtime context when export is enabled.
pub fn init(log_level: Option<Level>) -> Result<TelemetryGuard> {
	let fmt_layer = if std::io::stderr().is_terminal() {
		tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.pretty()
			.boxed()
	} else {
		tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.json()
			.boxed()
	};

	let tracer_provider = if otel_export_enabled() {
		Some(tracer_provider()?)
	} else {
		None
	};
	let otel_layer = tracer_provider.as_ref().map(|provider| {
		tracing_opentelemetry::layer()
			.with_error_records_to_exceptions(true)
			.with_tracer(provider.tracer(SERVICE_NAME))
	});

	tracing_subscriber::registry()
		.with(filter(log_level))
		.with(fmt_layer)
		.with(otel_layer)
		.init();

	Ok(TelemetryGuard { tracer_provider })
}

fn tracer_provider() -> Result<SdkTracerProvider> {
	// The builder already honours OTEL_SERVICE_NAME and OTEL_RESOURCE_ATTRIBUTES.
	let mut resource = Resource::builder();
	if std::env::var_os("OTEL_SERVICE_NAME").is_none() {
		resource = resource.with_service_name(SERVICE_NAME);
	}

	let exporter = opentelemetry_otlp::SpanExporter::builder()
		.with_tonic()
		.build()
		.context("building OTLP span exporter")?;

	let provider = SdkTracerProvider::builder()
		.with_resource(resource.build())
		.with_batch_exporter(exporter)
		.build();
	opentelemetry::global::set_tracer_provider(provider.clone());

	Ok(provider)
}
