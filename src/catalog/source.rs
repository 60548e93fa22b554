//! Descriptor sources the catalog store builds snapshots from.
//!
//! A source only has to answer one question, "what are all the models right now?".
//! Sources are queried on every (re)build and never cache, so a forced refresh always
//! observes the latest upstream state.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use super::{
    EMBEDDED_CATALOG,
    error::SourceError,
    types::{CatalogDocument, ModelDescriptor},
};
use crate::config::DescriptorSourceConfig;

/// Canonical list of model descriptors.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Fetch every descriptor, in catalog order.
    async fn fetch_all(&self) -> Result<Vec<ModelDescriptor>, SourceError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Parse a `{"models": [...]}` catalog document.
pub fn parse_catalog_document(json: &str) -> Result<Vec<ModelDescriptor>, SourceError> {
    let document: CatalogDocument =
        serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))?;
    Ok(document.models)
}

/// Build the configured descriptor source.
pub fn source_from_config(
    config: &DescriptorSourceConfig,
    http_client: &Client,
) -> Arc<dyn DescriptorSource> {
    match config {
        DescriptorSourceConfig::Embedded => Arc::new(EmbeddedSource),
        DescriptorSourceConfig::Static { models } => Arc::new(StaticSource::new(models.clone())),
        DescriptorSourceConfig::File { path } => Arc::new(FileSource::new(path)),
        DescriptorSourceConfig::Http { url, timeout_secs } => Arc::new(HttpSource::new(
            http_client.clone(),
            url.clone(),
            Duration::from_secs(*timeout_secs),
        )),
    }
}

/// The catalog compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

#[async_trait]
impl DescriptorSource for EmbeddedSource {
    async fn fetch_all(&self) -> Result<Vec<ModelDescriptor>, SourceError> {
        parse_catalog_document(EMBEDDED_CATALOG)
    }

    fn name(&self) -> &'static str {
        "embedded"
    }
}

/// Descriptors declared inline in the configuration file.
#[derive(Debug, Clone)]
pub struct StaticSource {
    models: Vec<ModelDescriptor>,
}

impl StaticSource {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }
}

#[async_trait]
impl DescriptorSource for StaticSource {
    async fn fetch_all(&self) -> Result<Vec<ModelDescriptor>, SourceError> {
        Ok(self.models.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// A JSON catalog document on disk, re-read on every build.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DescriptorSource for FileSource {
    async fn fetch_all(&self) -> Result<Vec<ModelDescriptor>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        parse_catalog_document(&contents)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// A remote JSON catalog document fetched over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DescriptorSource for HttpSource {
    async fn fetch_all(&self) -> Result<Vec<ModelDescriptor>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let json = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        parse_catalog_document(&json)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
