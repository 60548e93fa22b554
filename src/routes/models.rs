//! OpenAI-compatible model listing.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Serialize;

use super::error::ApiError;
use crate::{AppState, catalog::ResolvedModel};

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ResolvedModel>,
}

/// Caller identity taken from the configured trusted header.
///
/// Returns `(user_id, is_authenticated)`. Header presence alone marks the request as
/// authenticated; the value itself is validated by the service.
fn caller_identity<'a>(
    headers: &'a HeaderMap,
    header_name: &str,
) -> Result<(Option<&'a str>, bool), ApiError> {
    match headers.get(header_name) {
        None => Ok((None, false)),
        Some(value) => {
            let user_id = value
                .to_str()
                .map_err(|_| ApiError::InvalidHeader(header_name.to_string()))?;
            Ok((Some(user_id.trim()), true))
        }
    }
}

/// List every model in the catalog with the caller's accessibility flag.
#[tracing::instrument(name = "models.list", skip_all)]
pub async fn list_models(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ModelList>, ApiError> {
    let (user_id, is_authenticated) =
        caller_identity(&headers, &state.config.auth.identity_header)?;

    let data = state
        .model_access
        .list_models(user_id, is_authenticated)
        .await?;

    Ok(Json(ModelList {
        object: "list",
        data,
    }))
}

/// Look up a single model with the caller's accessibility flag.
#[tracing::instrument(name = "models.get", skip(state, headers))]
pub async fn get_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ResolvedModel>, ApiError> {
    let (user_id, is_authenticated) =
        caller_identity(&headers, &state.config.auth.identity_header)?;

    state
        .model_access
        .get_model(&model_id, user_id, is_authenticated)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Model '{model_id}' not found")))
}
