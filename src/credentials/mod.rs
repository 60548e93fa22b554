//! Per-user provider credential lookups.
//!
//! A lookup answers "which providers does this user hold keys for?". Only provider
//! names cross this boundary, never the keys themselves.
//!
//! Supports multiple backends:
//! - None (no credential store, every user holds no keys)
//! - Static map from configuration
//! - Remote HTTP credential service

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{
    catalog::ProviderSet,
    config::{ConfigError, CredentialLookupConfig},
};

#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("Credential store unreachable: {0}")]
    Unavailable(String),

    #[error("Credential store returned status {0}")]
    Status(u16),

    #[error("Credential store returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential lookup timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl LookupError {
    /// Short label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            LookupError::Unavailable(_) => "unavailable",
            LookupError::Status(_) => "status",
            LookupError::InvalidResponse(_) => "invalid_response",
            LookupError::Timeout(_) => "timeout",
        }
    }
}

/// Source of the set of providers a user holds credentials for.
#[async_trait]
pub trait ProviderKeyLookup: Send + Sync {
    /// List the providers `user_id` holds keys for. An unknown user holds none.
    async fn list_providers(&self, user_id: &str) -> Result<ProviderSet, LookupError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Build the configured lookup.
pub fn lookup_from_config(
    config: &CredentialLookupConfig,
    http_client: &Client,
) -> Result<Arc<dyn ProviderKeyLookup>, ConfigError> {
    Ok(match config {
        CredentialLookupConfig::None => Arc::new(NoKeysLookup),
        CredentialLookupConfig::Static { users } => Arc::new(StaticKeyLookup::new(users)),
        CredentialLookupConfig::Http { base_url } => Arc::new(
            HttpKeyLookup::new(http_client.clone(), base_url).map_err(|e| {
                ConfigError::Validation(format!("credentials.base_url is invalid: {e}"))
            })?,
        ),
    })
}

/// No credential store configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeysLookup;

#[async_trait]
impl ProviderKeyLookup for NoKeysLookup {
    async fn list_providers(&self, _user_id: &str) -> Result<ProviderSet, LookupError> {
        Ok(ProviderSet::empty())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Fixed user to provider mapping.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyLookup {
    users: HashMap<String, ProviderSet>,
}

impl StaticKeyLookup {
    pub fn new(users: &HashMap<String, Vec<String>>) -> Self {
        Self {
            users: users
                .iter()
                .map(|(user, providers)| (user.clone(), providers.iter().cloned().collect()))
                .collect(),
        }
    }
}

#[async_trait]
impl ProviderKeyLookup for StaticKeyLookup {
    async fn list_providers(&self, user_id: &str) -> Result<ProviderSet, LookupError> {
        Ok(self.users.get(user_id).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[derive(Debug, Deserialize)]
struct ProvidersResponse {
    providers: Vec<String>,
}

/// Remote credential service.
///
/// Calls `GET {base_url}/users/{user_id}/providers`. A 404 means the service does
/// not know the user, which is a legitimately empty set rather than a failure.
#[derive(Debug, Clone)]
pub struct HttpKeyLookup {
    client: Client,
    base_url: Url,
}

impl HttpKeyLookup {
    pub fn new(client: Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn providers_url(&self, user_id: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                LookupError::Unavailable(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["users", user_id, "providers"]);
        Ok(url)
    }
}

#[async_trait]
impl ProviderKeyLookup for HttpKeyLookup {
    async fn list_providers(&self, user_id: &str) -> Result<ProviderSet, LookupError> {
        let url = self.providers_url(user_id)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(user_id, "Credential store does not know user");
                return Ok(ProviderSet::empty());
            }
            status if !status.is_success() => {
                return Err(LookupError::Status(status.as_u16()));
            }
            _ => {}
        }

        let body: ProvidersResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                LookupError::InvalidResponse(e.to_string())
            } else {
                LookupError::Unavailable(e.to_string())
            }
        })?;

        Ok(body.providers.into_iter().collect())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
