//! Prometheus metrics for modelgate.
//!
//! Provides metrics for:
//! - Catalog builds, size and refreshes
//! - Credential lookup fallbacks
//! - Errors returned to callers
//!
//! Every recording function compiles to a no-op without the `prometheus` feature.

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, gauge, histogram};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Global Prometheus handle for the metrics endpoint.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Suffix("_duration_seconds".to_string()),
            &seconds_from_ms(&config.latency_buckets_ms),
        )
        .map_err(|e| MetricsError::Setup(e.to_string()))?;

    let handle = builder.install_recorder().map_err(MetricsError::Install)?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Convert millisecond buckets to seconds.
#[cfg(feature = "prometheus")]
fn seconds_from_ms(ms_buckets: &[f64]) -> Vec<f64> {
    ms_buckets.iter().map(|ms| ms / 1000.0).collect()
}

/// Get the Prometheus handle for rendering metrics.
#[cfg(feature = "prometheus")]
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record a finished catalog build. `outcome` is "success" or the error kind.
pub fn record_catalog_build(outcome: &str, duration_secs: f64) {
    #[cfg(feature = "prometheus")]
    {
        counter!("catalog_builds_total", "outcome" => outcome.to_string()).increment(1);
        histogram!("catalog_build_duration_seconds", "outcome" => outcome.to_string())
            .record(duration_secs);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (outcome, duration_secs);
    }
}

/// Record the size of a newly published snapshot.
pub fn record_catalog_size(models: usize) {
    #[cfg(feature = "prometheus")]
    gauge!("catalog_models").set(models as f64);
    #[cfg(not(feature = "prometheus"))]
    let _ = models;
}

/// Record a refresh request. `coalesced` is true when it joined a running refresh.
pub fn record_catalog_refresh(coalesced: bool) {
    #[cfg(feature = "prometheus")]
    counter!(
        "catalog_refreshes_total",
        "coalesced" => if coalesced { "true" } else { "false" }
    )
    .increment(1);
    #[cfg(not(feature = "prometheus"))]
    let _ = coalesced;
}

/// Record a listing that fell back to default-accessible models because the
/// credential store could not be consulted.
pub fn record_lookup_fallback(reason: &str) {
    #[cfg(feature = "prometheus")]
    counter!("model_access_lookup_fallbacks_total", "reason" => reason.to_string()).increment(1);
    #[cfg(not(feature = "prometheus"))]
    let _ = reason;
}

/// Record an error returned to a caller.
pub fn record_gateway_error(error_type: &str, error_code: &str) {
    #[cfg(feature = "prometheus")]
    counter!(
        "gateway_errors_total",
        "error_type" => error_type.to_string(),
        "error_code" => error_code.to_string()
    )
    .increment(1);
    #[cfg(not(feature = "prometheus"))]
    let _ = (error_type, error_code);
}

/// Metrics errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}
