//! Health probe tests driven through the router directly.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use carelink_api::{build_app, AppState};
use carelink_core::config::AppConfig;

async fn get_json(path: &str) -> (StatusCode, Value) {
    let app = build_app(AppState::new(AppConfig::default()));
    let response = app
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn bare_health_alias_matches() {
    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}
