//! Integration tests for health, metrics and request tracing.

mod common;

use axum::http::{Method, Request, StatusCode};
use common::{create_test_app, get_request, json_request, send};
use grouptrek_api::middleware::init_metrics;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check_healthy() {
    let app = create_test_app();

    let (status, body) = send(&app, get_request("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "memory");
    assert_eq!(body["storage"]["connected"], true);
    assert!(body["storage"]["latency_ms"].is_u64());
    assert_eq!(body["realtime"]["connections"], 0);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_probes() {
    let app = create_test_app();

    let (status, body) = send(&app, get_request("/api/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = send(&app, get_request("/api/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_store_outage() {
    let app = create_test_app();
    app.store.set_unavailable(true);

    let (status, body) = send(&app, get_request("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["storage"]["connected"], false);
    assert!(body["storage"]["latency_ms"].is_null());

    let (status, _) = send(&app, get_request("/api/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The process itself is still alive.
    let (status, _) = send(&app, get_request("/api/health/live")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/v1/groups", json!({ "name": "Trek" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");

    app.store.set_unavailable(false);
    let (status, _) = send(&app, get_request("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    init_metrics().unwrap();
    let app = create_test_app();
    send(
        &app,
        json_request(Method::POST, "/api/v1/groups", json!({ "name": "Trek" })),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("groups_created_total"));
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = create_test_app();

    let request = Request::builder()
        .uri("/api/health/live")
        .header("X-Request-ID", "trace-me-123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-123"
    );

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/health/live"))
        .await
        .unwrap();
    let generated = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app();

    let (status, _) = send(&app, get_request("/api/v1/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
