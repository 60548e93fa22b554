//! Operator-triggered catalog refreshes.
//!
//! A refresh invalidates the store and synchronously rebuilds it. Refreshes that
//! arrive while one is already running do not start another build; they await the
//! running refresh and receive its outcome.

use std::sync::{Arc, Weak};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use parking_lot::Mutex;

use super::{error::BuildError, store::CatalogStore, types::CatalogSnapshot};
use crate::observability::metrics;

/// Result of a completed refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The freshly built snapshot
    pub snapshot: Arc<CatalogSnapshot>,
    /// Models in the snapshot that was published before the refresh (0 if none)
    pub previous_count: usize,
    /// Models in the new snapshot
    pub new_count: usize,
}

type RefreshResult = Result<RefreshOutcome, BuildError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

#[derive(Default)]
struct RefreshSlot {
    /// Monotonic id so a finished refresh only clears its own entry.
    next_id: u64,
    running: Option<(u64, SharedRefresh)>,
}

/// Coalesces concurrent refresh requests into one rebuild.
///
/// The slot being empty is the idle state; holding a shared future is refreshing.
#[derive(Clone)]
pub struct RefreshCoordinator {
    store: CatalogStore,
    slot: Arc<Mutex<RefreshSlot>>,
}

impl RefreshCoordinator {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store,
            slot: Arc::new(Mutex::new(RefreshSlot::default())),
        }
    }

    /// Force a rebuild, or join the one already running.
    pub async fn trigger_refresh(&self) -> RefreshResult {
        let refresh = {
            let mut slot = self.slot.lock();
            match &slot.running {
                Some((id, refresh)) => {
                    tracing::info!(refresh_id = id, "Refresh already in progress, joining it");
                    metrics::record_catalog_refresh(true);
                    refresh.clone()
                }
                None => {
                    let id = slot.next_id;
                    slot.next_id += 1;
                    metrics::record_catalog_refresh(false);
                    let refresh = self.start_refresh(id);
                    slot.running = Some((id, refresh.clone()));
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Whether a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.slot.lock().running.is_some()
    }

    fn start_refresh(&self, id: u64) -> SharedRefresh {
        let store = self.store.clone();
        let slot = Arc::downgrade(&self.slot);

        // Spawned so a refresh whose callers all disconnect still rebuilds and
        // returns the coordinator to idle.
        let task = tokio::spawn({
            let slot = slot.clone();
            async move {
                let result = run_refresh(&store, id).await;
                clear_slot(&slot, id);
                result
            }
        });

        async move {
            let result = task
                .await
                .unwrap_or_else(|e| Err(BuildError::Interrupted(e.to_string())));
            clear_slot(&slot, id);
            result
        }
        .boxed()
        .shared()
    }
}

async fn run_refresh(store: &CatalogStore, id: u64) -> RefreshResult {
    let previous_count = store.peek().map(|s| s.len()).unwrap_or(0);
    tracing::info!(refresh_id = id, previous_count, "Refreshing model catalog");

    store.invalidate();
    let result = store.get().await.map(|snapshot| RefreshOutcome {
        new_count: snapshot.len(),
        previous_count,
        snapshot,
    });

    match &result {
        Ok(outcome) => tracing::info!(
            refresh_id = id,
            previous_count = outcome.previous_count,
            new_count = outcome.new_count,
            "Model catalog refreshed"
        ),
        Err(e) => tracing::error!(
            refresh_id = id,
            error = %e,
            "Model catalog refresh failed"
        ),
    }

    result
}

/// Return to idle, unless a newer refresh already took the slot.
fn clear_slot(slot: &Weak<Mutex<RefreshSlot>>, id: u64) {
    if let Some(slot) = slot.upgrade() {
        let mut guard = slot.lock();
        if matches!(guard.running, Some((running, _)) if running == id) {
            guard.running = None;
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}
