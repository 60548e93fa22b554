use std::{collections::HashSet, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::catalog::ModelDescriptor;

/// Model catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Where descriptors are loaded from.
    #[serde(default)]
    pub source: DescriptorSourceConfig,

    /// Build the catalog before accepting traffic. A failed warm-up is logged and
    /// the first request retries the build.
    #[serde(default = "default_true")]
    pub warm_on_startup: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: DescriptorSourceConfig::default(),
            warm_on_startup: true,
        }
    }
}

impl CatalogConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()
    }
}

/// Descriptor source selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum DescriptorSourceConfig {
    /// The catalog compiled into the binary.
    #[default]
    Embedded,

    /// Descriptors declared inline.
    Static { models: Vec<ModelDescriptor> },

    /// A `{"models": [...]}` JSON document on disk, re-read on every build.
    File { path: PathBuf },

    /// A `{"models": [...]}` JSON document fetched over HTTP on every build.
    Http {
        url: String,

        /// Per-request timeout in seconds.
        #[serde(default = "default_source_timeout")]
        timeout_secs: u64,
    },
}

impl DescriptorSourceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Embedded => Ok(()),
            Self::Static { models } => {
                let mut seen = HashSet::with_capacity(models.len());
                for model in models {
                    if !seen.insert(model.id.as_str()) {
                        return Err(ConfigError::Validation(format!(
                            "catalog.source.models contains duplicate model id '{}'",
                            model.id
                        )));
                    }
                }
                Ok(())
            }
            Self::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Validation(
                        "catalog.source.path cannot be empty".into(),
                    ));
                }
                Ok(())
            }
            Self::Http { url, timeout_secs } => {
                let parsed = url::Url::parse(url).map_err(|e| {
                    ConfigError::Validation(format!("catalog.source.url '{url}' is invalid: {e}"))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::Validation(format!(
                        "catalog.source.url must use http or https, got '{}'",
                        parsed.scheme()
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(ConfigError::Validation(
                        "catalog.source.timeout_secs must be greater than 0".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_source_timeout() -> u64 {
    30
}
