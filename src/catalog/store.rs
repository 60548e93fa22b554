//! In-memory catalog store with single-flight builds.
//!
//! The store publishes one immutable [`CatalogSnapshot`] at a time. Reads of a
//! published snapshot only take a read lock around an `Option<Arc<_>>`. When no
//! snapshot is published, the first caller starts a build and parks a shared future
//! in the build slot; every concurrent caller awaits that same future instead of
//! hitting the descriptor source again.
//!
//! Lock order is always `slot` before `snapshot`. Neither lock is held across an
//! await point.

use std::{
    collections::HashSet,
    sync::{Arc, Weak},
    time::Instant,
};

use chrono::Utc;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use parking_lot::{Mutex, RwLock};

use super::{
    error::BuildError,
    source::DescriptorSource,
    types::{CatalogSnapshot, ModelDescriptor},
};
use crate::observability::metrics;

type BuildResult = Result<Arc<CatalogSnapshot>, BuildError>;
type SharedBuild = Shared<BoxFuture<'static, BuildResult>>;

#[derive(Default)]
struct BuildSlot {
    /// Bumped by `invalidate()`; a build only publishes if its generation is current.
    generation: u64,
    in_flight: Option<SharedBuild>,
}

struct Inner {
    source: Arc<dyn DescriptorSource>,
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
    slot: Mutex<BuildSlot>,
}

impl Inner {
    fn finish_build(&self, generation: u64, result: &BuildResult) {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            tracing::debug!(
                build_generation = generation,
                current_generation = slot.generation,
                "Catalog invalidated during build, not publishing result"
            );
            return;
        }

        slot.in_flight = None;
        if let Ok(snapshot) = result {
            *self.snapshot.write() = Some(snapshot.clone());
            metrics::record_catalog_size(snapshot.len());
        }
    }
}

/// Shared handle to the process-wide model catalog.
///
/// Cloning is cheap; all clones observe the same snapshot and build slot.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<Inner>,
}

impl CatalogStore {
    /// Create an empty store. Nothing is fetched until the first [`get`](Self::get).
    pub fn new(source: Arc<dyn DescriptorSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                snapshot: RwLock::new(None),
                slot: Mutex::new(BuildSlot::default()),
            }),
        }
    }

    /// Return the current snapshot, building it first if none is published.
    ///
    /// Concurrent callers that find no snapshot share a single build and all
    /// receive its outcome, including its error.
    pub async fn get(&self) -> BuildResult {
        if let Some(snapshot) = self.peek() {
            return Ok(snapshot);
        }

        let build = {
            let mut slot = self.inner.slot.lock();

            // A build may have published between the fast path and taking the slot.
            if let Some(snapshot) = self.inner.snapshot.read().clone() {
                return Ok(snapshot);
            }

            match &slot.in_flight {
                Some(build) => {
                    tracing::debug!("Joining in-flight catalog build");
                    build.clone()
                }
                None => {
                    let build = self.start_build(slot.generation);
                    slot.in_flight = Some(build.clone());
                    build
                }
            }
        };

        build.await
    }

    /// Mark the published snapshot stale. The next [`get`](Self::get) rebuilds.
    ///
    /// Callers already waiting on an in-flight build still receive its result, but
    /// that result is not published.
    pub fn invalidate(&self) {
        let mut slot = self.inner.slot.lock();
        slot.generation += 1;
        slot.in_flight = None;
        *self.inner.snapshot.write() = None;
        tracing::debug!(generation = slot.generation, "Catalog invalidated");
    }

    /// The published snapshot, if any, without triggering a build.
    pub fn peek(&self) -> Option<Arc<CatalogSnapshot>> {
        self.inner.snapshot.read().clone()
    }

    /// Whether a build is currently in flight.
    pub fn is_building(&self) -> bool {
        self.inner.slot.lock().in_flight.is_some()
    }

    pub fn source_name(&self) -> &'static str {
        self.inner.source.name()
    }

    fn start_build(&self, generation: u64) -> SharedBuild {
        let source = self.inner.source.clone();
        // Weak so a build outliving every handle does not keep the store alive.
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        // Spawned so the build finishes and leaves the slot even if every caller
        // awaiting it is dropped.
        let task = tokio::spawn({
            let inner = inner.clone();
            async move {
                let result = build_snapshot(source.as_ref()).await.map(Arc::new);
                if let Some(inner) = inner.upgrade() {
                    inner.finish_build(generation, &result);
                }
                result
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    let result = Err(BuildError::Interrupted(e.to_string()));
                    if let Some(inner) = inner.upgrade() {
                        inner.finish_build(generation, &result);
                    }
                    result
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("source", &self.inner.source.name())
            .field("model_count", &self.peek().map(|s| s.len()))
            .field("building", &self.is_building())
            .finish()
    }
}

#[tracing::instrument(name = "catalog.build", skip_all, fields(source = source.name()))]
async fn build_snapshot(source: &dyn DescriptorSource) -> Result<CatalogSnapshot, BuildError> {
    let start = Instant::now();

    let result = match source.fetch_all().await {
        Ok(models) => {
            ensure_unique_ids(&models).map(|()| CatalogSnapshot::new(models, Utc::now()))
        }
        Err(e) => Err(BuildError::from(e)),
    };

    let duration = start.elapsed();
    match &result {
        Ok(snapshot) => {
            tracing::info!(
                model_count = snapshot.len(),
                duration_ms = duration.as_millis() as u64,
                "Model catalog built"
            );
            metrics::record_catalog_build("success", duration.as_secs_f64());
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                duration_ms = duration.as_millis() as u64,
                "Model catalog build failed"
            );
            metrics::record_catalog_build(e.kind(), duration.as_secs_f64());
        }
    }

    result
}

fn ensure_unique_ids(models: &[ModelDescriptor]) -> Result<(), BuildError> {
    let mut seen = HashSet::with_capacity(models.len());
    for model in models {
        if !seen.insert(model.id.as_str()) {
            return Err(BuildError::DuplicateModelId(model.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        error::SourceError,
        test_support::{ScriptedSource, three_models, two_models, wait_for_calls},
    };

    #[tokio::test]
    async fn test_get_builds_once_and_caches() {
        let source = Arc::new(ScriptedSource::new(two_models()));
        let store = CatalogStore::new(source.clone());

        assert!(store.peek().is_none());

        let first = store.get().await.unwrap();
        let second = store.get().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert!(store.peek().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_first_gets_share_one_build() {
        let (source, gate) = ScriptedSource::gated(two_models());
        let source = Arc::new(source);
        let store = CatalogStore::new(source.clone());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get().await })
            })
            .collect();

        wait_for_calls(&source, 1).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.is_building());
        gate.add_permits(64);

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(source.calls(), 1);
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
        assert!(!store.is_building());
    }

    #[tokio::test]
    async fn test_failed_build_reaches_all_waiters_and_publishes_nothing() {
        let (source, gate) = ScriptedSource::gated(two_models());
        source.fail_with(SourceError::Http("connection refused".into()));
        let source = Arc::new(source);
        let store = CatalogStore::new(source.clone());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get().await })
            })
            .collect();

        wait_for_calls(&source, 1).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        gate.add_permits(64);

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, BuildError::Source(SourceError::Http(_))));
        }
        assert_eq!(source.calls(), 1);
        assert!(store.peek().is_none());

        // A later caller retries independently
        source.set_models(two_models());
        let snapshot = store.get().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_defers_rebuild_to_next_get() {
        let source = Arc::new(ScriptedSource::new(two_models()));
        let store = CatalogStore::new(source.clone());

        let before = store.get().await.unwrap();
        source.set_models(three_models());

        // Source changes are invisible until invalidated
        assert_eq!(store.get().await.unwrap().len(), 2);

        store.invalidate();
        assert!(store.peek().is_none());
        assert_eq!(source.calls(), 1, "invalidate must not rebuild by itself");

        let after = store.get().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(after.len(), 3);
        assert_eq!(before.len(), 2, "old snapshot is untouched");
    }

    #[tokio::test]
    async fn test_invalidate_during_build_discards_result() {
        let (source, gate) = ScriptedSource::gated(two_models());
        let source = Arc::new(source);
        let store = CatalogStore::new(source.clone());

        let waiting = {
            let store = store.clone();
            tokio::spawn(async move { store.get().await })
        };
        wait_for_calls(&source, 1).await;

        store.invalidate();
        source.set_models(three_models());
        gate.add_permits(64);

        // The waiter still gets the build it joined
        let stale = waiting.await.unwrap().unwrap();
        assert_eq!(stale.len(), 2);
        assert!(store.peek().is_none());

        let fresh = store.get().await.unwrap();
        assert_eq!(fresh.len(), 3);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_ids_fail_build() {
        let mut models = two_models();
        models.push(ModelDescriptor::new("m1", "anthropic", "Shadow", false));
        let store = CatalogStore::new(Arc::new(ScriptedSource::new(models)));

        let err = store.get().await.unwrap_err();
        assert!(matches!(err, BuildError::DuplicateModelId(ref id) if id == "m1"));
        assert!(store.peek().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_preserves_source_order() {
        let store = CatalogStore::new(Arc::new(ScriptedSource::new(three_models())));
        let snapshot = store.get().await.unwrap();
        let ids: Vec<_> = snapshot.models().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_abandoned_build_still_publishes() {
        let (source, gate) = ScriptedSource::gated(two_models());
        let source = Arc::new(source);
        let store = CatalogStore::new(source.clone());

        let abandoned = {
            let store = store.clone();
            tokio::spawn(async move { store.get().await })
        };
        wait_for_calls(&source, 1).await;
        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());

        gate.add_permits(64);
        while store.is_building() {
            tokio::task::yield_now().await;
        }

        assert_eq!(store.peek().map(|s| s.len()), Some(2));
        assert_eq!(source.calls(), 1);
    }
}
