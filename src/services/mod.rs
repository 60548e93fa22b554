mod model_access;

pub use model_access::{
    CatalogState, CatalogStatus, ModelAccessService, ProviderAccess, RefreshSummary,
    ServiceError,
};
