use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use voxbridge::{ServerConfig, routes, state::AppState};

fn test_app(config: ServerConfig) -> axum::Router {
    let app_state = AppState::new(config).unwrap();
    routes::create_app(app_state)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = get_json(test_app(ServerConfig::default()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "OK"}));
}

#[tokio::test]
async fn test_health_reports_default_provider() {
    let config = ServerConfig {
        asr_provider: "Alibaba".to_string(),
        ..Default::default()
    };

    let (status, body) = get_json(test_app(config), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "provider": "alibaba"}));
}

#[tokio::test]
async fn test_list_providers() {
    let config = ServerConfig {
        volcengine_app_id: "app".to_string(),
        volcengine_access_token: "token".to_string(),
        ..Default::default()
    };

    let (status, body) = get_json(test_app(config), "/providers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"name": "volcengine", "display_name": "Volcengine", "default": true, "configured": true},
            {"name": "alibaba", "display_name": "Alibaba Cloud", "default": false, "configured": false}
        ])
    );
}

#[tokio::test]
async fn test_get_provider_by_name() {
    let (status, body) = get_json(test_app(ServerConfig::default()), "/providers/ALIBABA").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alibaba");
    assert_eq!(body["display_name"], "Alibaba Cloud");
}

#[tokio::test]
async fn test_get_unknown_provider_is_not_found() {
    let (status, body) = get_json(test_app(ServerConfig::default()), "/providers/whisper").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown provider: whisper");
    assert_eq!(body["status"], 404);
}

#[test]
fn test_unknown_default_provider_fails_state_creation() {
    let config = ServerConfig {
        asr_provider: "deepgram".to_string(),
        ..Default::default()
    };

    assert!(AppState::new(config).is_err());
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let config = ServerConfig {
        cors_allowed_origins: Some(vec!["http://localhost:5173".to_string()]),
        ..Default::default()
    };
    let app = test_app(config);

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://evil.test")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
