//! HTTP intake tests
//!
//! Exercise the full router (auth middleware, handlers, health, metrics)
//! without binding a socket.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt; // For oneshot()

use comment_notify::config::{ApiConfig, LoggingConfig, NotifyConfig, ServerConfig, Settings};
use comment_notify::notify::NotifyService;
use comment_notify::server::{create_app, AppState};

use common::{as_destinations, MockDestination};

fn settings(api_key: Option<&str>) -> Settings {
    Settings {
        server: ServerConfig::default(),
        api: ApiConfig {
            key: api_key.map(str::to_string),
        },
        notify: NotifyConfig::default(),
        logging: LoggingConfig::default(),
    }
}

fn app(api_key: Option<&str>, notifier: Arc<NotifyService>) -> Router {
    create_app(AppState::new(settings(api_key), notifier))
}

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn comment_request(body: Value, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/comments")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_submit_comment_is_delivered() {
    let dest = MockDestination::new("d1", Duration::from_millis(10));
    let notifier = Arc::new(NotifyService::new(
        &CancellationToken::new(),
        10,
        as_destinations(&[dest.clone()]),
    ));

    let response = app(None, notifier.clone())
        .oneshot(comment_request(
            json!({
                "id": "c-42",
                "locator": { "site": "blog", "url": "https://example.com/post" },
                "user": { "id": "u-1", "name": "Reader" },
                "text": "Nice post"
            }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["accepted"], true);
    assert!(body["notification_id"].is_string());

    tokio::time::sleep(Duration::from_millis(50)).await;
    notifier.close().await;

    assert_eq!(dest.received(), vec!["c-42"]);
}

#[tokio::test]
async fn test_submit_comment_requires_id() {
    let notifier = Arc::new(NotifyService::disabled());

    let response = app(None, notifier)
        .oneshot(comment_request(json!({ "id": "  " }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_api_key_enforced() {
    let notifier = Arc::new(NotifyService::disabled());

    let missing = app(Some("secret"), notifier.clone())
        .oneshot(comment_request(json!({ "id": "1" }), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app(Some("secret"), notifier.clone())
        .oneshot(comment_request(json!({ "id": "1" }), Some("guess")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = app(Some("secret"), notifier.clone())
        .oneshot(comment_request(json!({ "id": "1" }), Some("secret")))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::ACCEPTED);
    assert_eq!(notifier.stats().submitted, 1);
}

#[tokio::test]
async fn test_submit_after_close_still_accepted() {
    let notifier = Arc::new(NotifyService::disabled());
    notifier.close().await;

    let response = app(None, notifier.clone())
        .oneshot(comment_request(json!({ "id": "late" }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_health_reports_notifier() {
    let dest = MockDestination::new("ops", Duration::from_millis(10));
    let notifier = Arc::new(NotifyService::new(
        &CancellationToken::new(),
        3,
        as_destinations(&[dest]),
    ));

    let response = app(None, notifier.clone())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["notifier"]["enabled"], true);
    assert_eq!(body["notifier"]["closed"], false);
    assert_eq!(body["notifier"]["destinations"], json!(["ops"]));

    notifier.close().await;

    let response = app(None, notifier)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "shutting_down");
    assert_eq!(body["notifier"]["closed"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let notifier = Arc::new(NotifyService::disabled());
    notifier.submit(comment_notify::notify::Comment::with_id("1"));

    let response = app(None, notifier)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("notify_submitted_total"));
}
