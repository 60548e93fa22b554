//! Per-user access resolution against a shared catalog snapshot.

use super::types::{CatalogSnapshot, ModelDescriptor, ProviderSet, ResolvedModel};

/// Annotate every descriptor in `snapshot` with whether `providers` unlocks it.
///
/// A model is accessible when it is open by default or the user holds a key for its
/// provider. Output order matches snapshot order. Pure: no I/O, no caching, so it is
/// safe to run fresh on every request against the one shared snapshot.
pub fn resolve(snapshot: &CatalogSnapshot, providers: &ProviderSet) -> Vec<ResolvedModel> {
    snapshot
        .models()
        .iter()
        .map(|model| resolve_model(model, providers))
        .collect()
}

/// Annotate a single descriptor.
pub fn resolve_model(model: &ModelDescriptor, providers: &ProviderSet) -> ResolvedModel {
    ResolvedModel {
        accessible: model.accessible_default || providers.contains(&model.provider),
        model: model.clone(),
    }
}
