//! Log and span pipeline setup.
//!
//! [`init_tracing`] installs the process-wide `tracing` subscriber. With no
//! configuration it prints compact console logs; span export to an OTLP
//! collector switches on through the environment.
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter, `"info"` when unset. |
//! | `ELFOS_LOG_FORMAT=json` | Newline-delimited JSON instead of the compact formatter. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | Base URL of an OTLP/HTTP collector. Span export is off without it. |
//!
//! ```rust,no_run
//! // Keep the guard alive until shutdown so buffered spans get flushed.
//! let _guard = elfos_runtime::telemetry::init_tracing("elfos");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Install the global subscriber and, if configured, the OTLP span exporter.
///
/// Spans from the worker, producer, and pool layers flow to the collector
/// named by `OTEL_EXPORTER_OTLP_ENDPOINT`; without that variable only the
/// console formatter is active.
///
/// Keep the returned [`TracerProviderGuard`] alive for the whole run.
/// Dropping it is what flushes spans still sitting in the exporter.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let use_json = std::env::var("ELFOS_LOG_FORMAT").as_deref() == Ok("json");

    let provider = build_provider(service_name);

    if let Some(ref p) = provider {
        let tracer = p.tracer("elfos");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        if use_json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
    } else if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    TracerProviderGuard(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// Shutdown guard
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the [`SdkTracerProvider`] and shuts it down on drop.
///
/// Shutdown drains whatever the exporter has buffered; a process that exits
/// without dropping the guard can lose its final spans. `main` should bind
/// it to a `_guard` local and let scope end do the work.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("[elfos] span exporter shutdown failed: {e}");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Provider construction, gated on `OTEL_EXPORTER_OTLP_ENDPOINT`.
///
/// Any failure here is reported to stderr and answered with `None`, so a
/// broken collector config degrades to console-only logging instead of
/// aborting startup.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[elfos] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // Simple exporter, not batch: init_tracing runs before the CLI
            // builds its Tokio runtime, and the batch exporter spawns tasks.
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_endpoint_means_no_provider() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(
            build_provider("test-service").is_none(),
            "provider should only exist when an endpoint is configured"
        );
    }

    #[test]
    fn empty_guard_drops_cleanly() {
        let guard = TracerProviderGuard(None);
        drop(guard); // must not panic
    }
}
