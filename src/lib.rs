//! Model catalog service.
//!
//! Serves an OpenAI-compatible `/v1/models` listing in which every model carries an
//! `accessible` flag computed from the providers the caller holds keys for.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod observability;
pub mod routes;
pub mod services;
pub mod validation;

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use thiserror::Error;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{catalog::CatalogStore, services::ModelAccessService};

#[derive(Debug, Error)]
pub enum AppStateError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub model_access: ModelAccessService,
}

impl AppState {
    /// Wire the catalog store, credential lookup and service from configuration. The
    /// HTTP source and the HTTP lookup share one connection pool.
    ///
    /// Nothing is fetched here; the catalog is built on first use or by an explicit warm-up.
    pub fn new(config: config::AppConfig) -> Result<Self, AppStateError> {
        let http_client = config.server.http_client.build_client()?;

        let source = catalog::source_from_config(&config.catalog.source, &http_client);
        let store = CatalogStore::new(source);
        let lookup = credentials::lookup_from_config(&config.credentials.lookup, &http_client)?;
        let lookup_timeout = Duration::from_millis(config.credentials.timeout_ms);

        tracing::debug!(
            source = store.source_name(),
            lookup = lookup.name(),
            lookup_timeout_ms = config.credentials.timeout_ms,
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            model_access: ModelAccessService::new(store, lookup, lookup_timeout),
        })
    }
}

pub fn build_app(config: &config::AppConfig, state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness));

    if config.observability.metrics.enabled {
        app = app.route("/metrics", get(routes::health::metrics));
    }

    app.nest("/v1", routes::get_api_routes())
        .nest("/admin/v1", routes::get_admin_routes())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .with_state(state)
}
