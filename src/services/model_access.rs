//! Per-user model listings and operator refreshes over the shared catalog.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
    catalog::{
        BuildError, CatalogStore, ProviderSet, RefreshCoordinator, ResolvedModel, resolve,
        resolve_model,
    },
    credentials::{LookupError, ProviderKeyLookup},
    observability::metrics,
    validation::{ValidationError, validate_user_id},
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model catalog unavailable: {0}")]
    Catalog(#[from] BuildError),
}

/// How the provider set for a listing was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderAccess {
    /// Unauthenticated caller. Only default-accessible models.
    Anonymous,
    /// The credential store answered. The set may legitimately be empty.
    Keys(ProviderSet),
    /// The credential store could not be consulted. Only default-accessible models.
    Fallback { reason: &'static str },
}

impl ProviderAccess {
    pub fn providers(&self) -> ProviderSet {
        match self {
            ProviderAccess::Keys(providers) => providers.clone(),
            ProviderAccess::Anonymous | ProviderAccess::Fallback { .. } => ProviderSet::empty(),
        }
    }
}

/// Result of an operator refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub previous_count: usize,
    pub new_count: usize,
    /// When the new snapshot was built.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogState {
    Ready,
    Empty,
}

/// Point-in-time view of the catalog for operators. Never triggers a build.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub status: CatalogState,
    pub source: &'static str,
    pub model_count: usize,
    pub built_at: Option<DateTime<Utc>>,
    pub refreshing: bool,
}

/// Entry point for model listings and catalog refreshes.
///
/// Cloning is cheap and every clone shares the same store and coordinator.
#[derive(Clone)]
pub struct ModelAccessService {
    store: CatalogStore,
    coordinator: RefreshCoordinator,
    lookup: Arc<dyn ProviderKeyLookup>,
    lookup_timeout: Duration,
}

impl ModelAccessService {
    pub fn new(
        store: CatalogStore,
        lookup: Arc<dyn ProviderKeyLookup>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            coordinator: RefreshCoordinator::new(store.clone()),
            store,
            lookup,
            lookup_timeout,
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// List every catalog model annotated with whether the caller can use it.
    ///
    /// Fails only on an invalid identity or when the catalog cannot be built. A
    /// credential store failure degrades to default-accessible models.
    #[tracing::instrument(
        name = "model_access.list_models",
        skip_all,
        fields(authenticated = is_authenticated, user_id = tracing::field::Empty)
    )]
    pub async fn list_models(
        &self,
        user_id: Option<&str>,
        is_authenticated: bool,
    ) -> Result<Vec<ResolvedModel>, ServiceError> {
        let user_id = authenticated_user(user_id, is_authenticated)?;
        let snapshot = self.store.get().await?;
        let access = self.access_for(user_id).await;
        Ok(resolve(&snapshot, &access.providers()))
    }

    /// Look up one model for the caller. `Ok(None)` when the id is not in the catalog.
    #[tracing::instrument(
        name = "model_access.get_model",
        skip(self, user_id),
        fields(authenticated = is_authenticated, user_id = tracing::field::Empty)
    )]
    pub async fn get_model(
        &self,
        model_id: &str,
        user_id: Option<&str>,
        is_authenticated: bool,
    ) -> Result<Option<ResolvedModel>, ServiceError> {
        let user_id = authenticated_user(user_id, is_authenticated)?;
        let snapshot = self.store.get().await?;
        let Some(model) = snapshot.get(model_id) else {
            return Ok(None);
        };
        let access = self.access_for(user_id).await;
        Ok(Some(resolve_model(model, &access.providers())))
    }

    /// Work out the caller's provider set.
    ///
    /// Validation happens before the credential store is touched.
    pub async fn resolve_access(
        &self,
        user_id: Option<&str>,
        is_authenticated: bool,
    ) -> Result<ProviderAccess, ValidationError> {
        let user_id = authenticated_user(user_id, is_authenticated)?;
        Ok(self.access_for(user_id).await)
    }

    async fn access_for(&self, user_id: Option<&str>) -> ProviderAccess {
        let Some(user_id) = user_id else {
            return ProviderAccess::Anonymous;
        };

        match self.lookup_providers(user_id).await {
            Ok(providers) => ProviderAccess::Keys(providers),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    lookup = self.lookup.name(),
                    reason = e.reason(),
                    error = %e,
                    "Credential lookup failed, listing default-accessible models only"
                );
                metrics::record_lookup_fallback(e.reason());
                ProviderAccess::Fallback { reason: e.reason() }
            }
        }
    }

    async fn lookup_providers(&self, user_id: &str) -> Result<ProviderSet, LookupError> {
        tokio::time::timeout(self.lookup_timeout, self.lookup.list_providers(user_id))
            .await
            .unwrap_or(Err(LookupError::Timeout(self.lookup_timeout)))
    }

    /// Force a catalog rebuild, or join the one already running.
    pub async fn refresh_catalog(&self) -> Result<RefreshSummary, BuildError> {
        let outcome = self.coordinator.trigger_refresh().await?;
        Ok(RefreshSummary {
            previous_count: outcome.previous_count,
            new_count: outcome.new_count,
            timestamp: outcome.snapshot.built_at(),
        })
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        let snapshot = self.store.peek();
        CatalogStatus {
            status: if snapshot.is_some() {
                CatalogState::Ready
            } else {
                CatalogState::Empty
            },
            source: self.store.source_name(),
            model_count: snapshot.as_ref().map_or(0, |s| s.len()),
            built_at: snapshot.as_ref().map(|s| s.built_at()),
            refreshing: self.coordinator.is_refreshing(),
        }
    }
}

/// The validated id of an authenticated caller, `None` for anonymous callers.
fn authenticated_user(
    user_id: Option<&str>,
    is_authenticated: bool,
) -> Result<Option<&str>, ValidationError> {
    if !is_authenticated {
        return Ok(None);
    }
    let user_id = validate_user_id(user_id)?;
    tracing::Span::current().record("user_id", user_id);
    Ok(Some(user_id))
}

impl std::fmt::Debug for ModelAccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAccessService")
            .field("store", &self.store)
            .field("lookup", &self.lookup.name())
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}
