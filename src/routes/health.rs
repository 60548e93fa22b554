//! Health check endpoints for Kubernetes probes and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;
#[cfg(feature = "prometheus")]
use crate::observability::metrics::get_prometheus_handle;

/// Detailed health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "degraded"
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Catalog readiness
    pub catalog: CatalogHealth,
}

#[derive(Debug, Serialize)]
pub struct CatalogHealth {
    /// Whether a snapshot is published
    pub ready: bool,
    pub model_count: usize,
    pub refreshing: bool,
}

/// Health check with catalog readiness.
///
/// An unbuilt catalog is reported as "degraded" but still answers 200: the next
/// listing builds it, so the process is able to serve.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.model_access.catalog_status();
    let ready = catalog.built_at.is_some();

    Json(HealthStatus {
        status: if ready { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        catalog: CatalogHealth {
            ready,
            model_count: catalog.model_count,
            refreshing: catalog.refreshing,
        },
    })
}

/// Kubernetes liveness probe.
///
/// Returns 200 if the service is running.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// Prometheus metrics endpoint.
///
/// Returns metrics in Prometheus text format.
#[tracing::instrument(name = "health.metrics")]
pub async fn metrics() -> impl IntoResponse {
    #[cfg(feature = "prometheus")]
    {
        match get_prometheus_handle() {
            Some(handle) => (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            ),
            None => (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            ),
        }
    }
    #[cfg(not(feature = "prometheus"))]
    (
        StatusCode::NOT_FOUND,
        [("content-type", "text/plain")],
        "Prometheus metrics not enabled".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{STATIC_CATALOG, get_json, get_raw, test_app};

    #[tokio::test]
    async fn test_health_reports_catalog_readiness() {
        let app = test_app(STATIC_CATALOG);

        let (status, body) = get_json(&app, "/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["catalog"]["ready"], false);
        assert!(body["version"].as_str().unwrap().contains('.'));

        get_json(&app, "/v1/models", &[]).await;

        let (status, body) = get_json(&app, "/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["catalog"]["ready"], true);
        assert_eq!(body["catalog"]["model_count"], 2);
    }

    #[tokio::test]
    async fn test_health_does_not_build_catalog() {
        let app = test_app(STATIC_CATALOG);

        get_json(&app, "/health", &[]).await;
        let (_, body) = get_json(&app, "/health", &[]).await;
        assert_eq!(body["catalog"]["ready"], false);
    }

    #[tokio::test]
    async fn test_liveness_always_ok() {
        let app = test_app(STATIC_CATALOG);

        let (status, _) = get_raw(&app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[cfg(feature = "prometheus")]
    #[tokio::test]
    async fn test_metrics_endpoint_without_recorder() {
        let app = test_app(STATIC_CATALOG);

        let (status, body) = get_raw(&app, "/metrics").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("not initialized"));
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let app = test_app(
            r#"
            [observability.metrics]
            enabled = false
        "#,
        );

        let (status, _) = get_raw(&app, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
