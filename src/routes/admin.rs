//! Operator endpoints for the model catalog.
//!
//! These routes carry no authentication of their own. Expose `/admin` only on an
//! internal listener or behind a proxy that restricts it to operators.

use axum::{Json, extract::State};

use super::error::ApiError;
use crate::{
    AppState,
    services::{CatalogStatus, RefreshSummary},
};

/// Current catalog status. Never triggers a build.
#[tracing::instrument(name = "admin.catalog.status", skip(state))]
pub async fn catalog_status(State(state): State<AppState>) -> Json<CatalogStatus> {
    Json(state.model_access.catalog_status())
}

/// Rebuild the catalog from its source.
///
/// Concurrent calls share one rebuild and all report its outcome.
#[tracing::instrument(name = "admin.catalog.refresh", skip(state))]
pub async fn refresh_catalog(
    State(state): State<AppState>,
) -> Result<Json<RefreshSummary>, ApiError> {
    let summary = state.model_access.refresh_catalog().await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use crate::routes::test_support::{
        STATIC_CATALOG, get_json, post_json, test_app, test_app_with_state,
    };

    #[tokio::test]
    async fn test_status_before_and_after_first_listing() {
        let app = test_app(STATIC_CATALOG);

        let (status, body) = get_json(&app, "/admin/v1/catalog", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "empty");
        assert_eq!(body["model_count"], 0);
        assert!(body["built_at"].is_null());
        assert_eq!(body["refreshing"], false);
        assert_eq!(body["source"], "static");

        get_json(&app, "/v1/models", &[]).await;

        let (_, body) = get_json(&app, "/admin/v1/catalog", &[]).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["model_count"], 2);
        assert!(body["built_at"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_reports_counts() {
        let (app, state) = test_app_with_state(STATIC_CATALOG);
        state.model_access.store().get().await.unwrap();

        let (status, body) = post_json(&app, "/admin/v1/catalog/refresh").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["previous_count"], 2);
        assert_eq!(body["new_count"], 2);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"models": [
                {"id": "m1", "provider": "openai", "display_name": "Model One"},
                {"id": "m2", "provider": "local", "display_name": "Model Two", "accessible_default": true}
            ]}"#,
        )
        .unwrap();

        let app = test_app(&format!(
            "[catalog.source]\ntype = \"file\"\npath = {:?}\n",
            path.display().to_string()
        ));

        let (_, body) = get_json(&app, "/v1/models", &[]).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        std::fs::write(
            &path,
            r#"{"models": [
                {"id": "m1", "provider": "openai", "display_name": "Model One"},
                {"id": "m2", "provider": "local", "display_name": "Model Two", "accessible_default": true},
                {"id": "m3", "provider": "anthropic", "display_name": "Model Three"}
            ]}"#,
        )
        .unwrap();

        let (_, body) = get_json(&app, "/v1/models", &[]).await;
        assert_eq!(
            body["data"].as_array().unwrap().len(),
            2,
            "file edits stay invisible until a refresh"
        );

        let (status, body) = post_json(&app, "/admin/v1/catalog/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["previous_count"], 2);
        assert_eq!(body["new_count"], 3);

        let (_, body) = get_json(&app, "/v1/models", &[]).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_503() {
        let app = test_app(
            r#"
            [catalog.source]
            type = "file"
            path = "/nonexistent/catalog.json"
        "#,
        );

        let (status, body) = post_json(&app, "/admin/v1/catalog/refresh").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "catalog_unavailable");

        let (_, body) = get_json(&app, "/admin/v1/catalog", &[]).await;
        assert_eq!(body["status"], "empty");
        assert_eq!(body["refreshing"], false);
    }

    #[tokio::test]
    async fn test_refresh_requires_post() {
        let app = test_app(STATIC_CATALOG);
        let (status, _) = get_json(&app, "/admin/v1/catalog/refresh", &[]).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
