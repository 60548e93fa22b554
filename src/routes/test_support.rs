//! Router builders and request helpers for route tests.

use axum::{Router, body::Body};
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, build_app, config::AppConfig};

/// `m1` needs an openai key, `m2` is open to everyone, and alice holds an openai key.
pub(crate) const STATIC_CATALOG: &str = r#"
[catalog]
warm_on_startup = false

[catalog.source]
type = "static"
models = [
    { id = "m1", provider = "openai", display_name = "Model One" },
    { id = "m2", provider = "local", display_name = "Model Two", accessible_default = true },
]

[credentials.lookup]
type = "static"

[credentials.lookup.users]
alice = ["openai"]

[observability.metrics]
enabled = true
"#;

pub(crate) fn test_app(config: &str) -> Router {
    let config = AppConfig::from_str(config).expect("Failed to parse test config");
    let state = AppState::new(config.clone()).expect("Failed to create AppState");
    build_app(&config, state)
}

/// Build the router and also hand back its state, for tests that inspect the store.
pub(crate) fn test_app_with_state(config: &str) -> (Router, AppState) {
    let config = AppConfig::from_str(config).expect("Failed to parse test config");
    let state = AppState::new(config.clone()).expect("Failed to create AppState");
    (build_app(&config, state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub(crate) async fn get_json(
    app: &Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (status, body) = send(app, builder.body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub(crate) async fn get_raw(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

pub(crate) async fn post_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}
