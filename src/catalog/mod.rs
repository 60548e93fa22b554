//! Model catalog: descriptor sources, the shared snapshot store, and per-user access
//! resolution.
//!
//! The catalog is built once from a [`DescriptorSource`] into an immutable
//! [`CatalogSnapshot`] and shared by every request. Per-user accessibility is never
//! stored on the snapshot; it is computed on demand by [`resolve`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use modelgate::catalog::{CatalogStore, EmbeddedSource, ProviderSet, resolve};
//!
//! let store = CatalogStore::new(Arc::new(EmbeddedSource));
//! let snapshot = store.get().await?;
//!
//! let providers: ProviderSet = ["openai"].into_iter().collect();
//! for model in resolve(&snapshot, &providers) {
//!     println!("{} accessible={}", model.model.id, model.accessible);
//! }
//! ```

mod error;
mod refresh;
mod resolver;
mod source;
mod store;
#[cfg(test)]
pub(crate) mod test_support;
mod types;

pub use error::{BuildError, SourceError};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use resolver::{resolve, resolve_model};
pub use source::{
    DescriptorSource, EmbeddedSource, FileSource, HttpSource, StaticSource,
    parse_catalog_document, source_from_config,
};
pub use store::CatalogStore;
pub use types::{
    CatalogDocument, CatalogSnapshot, ModelCapabilities, ModelDescriptor, ProviderSet,
    ResolvedModel,
};

/// The catalog compiled into the binary, used by the `embedded` source.
pub const EMBEDDED_CATALOG: &str = include_str!("../../data/default-catalog.json");
