//! Common test utilities for integration tests.
//!
//! The app is built on the in-memory record store, so these tests need no
//! external services.

// Not every integration test uses every helper.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fake::{faker::name::en::FirstName, Fake};
use grouptrek_api::{
    app::{create_app, AppState},
    config::{
        Config, DatabaseConfig, GroupsConfig, LoggingConfig, RealtimeConfig, SecurityConfig,
        ServerConfig, StorageConfig,
    },
};
use persistence::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Test configuration on the in-memory backend.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 65_536,
        },
        storage: StorageConfig::default(),
        database: DatabaseConfig::default(),
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        groups: GroupsConfig {
            code_prefix: "GRT".to_string(),
            ttl_hours: 24,
            sweep_interval_minutes: 60,
            max_code_attempts: 100,
        },
        realtime: RealtimeConfig { outbound_buffer: 64 },
        security: SecurityConfig::default(),
    }
}

/// A router plus handles on its state, for tests that need to reach
/// behind the HTTP surface.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config())
}

pub fn create_test_app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone());
    TestApp {
        router: create_app(state.clone()),
        state,
        store,
    }
}

/// Serves the app on an ephemeral local port.
pub async fn spawn_server(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });
    addr
}

pub fn random_name() -> String {
    FirstName().fake()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Sends a request and returns the status with the parsed JSON body.
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, parse_response_body(response).await)
}

pub async fn create_group(app: &TestApp, name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(Method::POST, "/api/v1/groups", json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create group failed: {}", body);
    body
}

pub async fn join_group(app: &TestApp, group_id: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            &format!("/api/v1/groups/{}/members", group_id),
            json!({ "name": name }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "join failed: {}", body);
    body
}

pub async fn update_location(
    app: &TestApp,
    member_id: &str,
    latitude: f64,
    longitude: f64,
) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            Method::PUT,
            &format!("/api/v1/members/{}/location", member_id),
            json!({ "latitude": latitude, "longitude": longitude }),
        ),
    )
    .await
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("body has no id").to_string()
}
