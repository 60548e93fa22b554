pub mod admin;
pub mod error;
pub mod health;
pub mod models;
#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::{ApiError, ErrorInfo, ErrorResponse};

use crate::AppState;

/// Public, OpenAI-compatible routes.
pub fn get_api_routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(models::list_models))
        .route("/models/{model_id}", get(models::get_model))
}

/// Operator routes.
pub fn get_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(admin::catalog_status))
        .route("/catalog/refresh", post(admin::refresh_catalog))
}
