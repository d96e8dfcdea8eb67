use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use persistence::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::realtime::ws_handler;
use crate::routes::{groups, health, members, messages, pings};
use crate::services::SessionCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecordStore>,
    pub sessions: SessionCoordinator,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        let sessions = SessionCoordinator::new(store.clone(), &config.groups);
        Self {
            config: Arc::new(config),
            store,
            sessions,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        // Groups
        .route("/api/v1/groups", post(groups::create_group))
        .route("/api/v1/groups/:group_id", get(groups::get_group))
        .route("/api/v1/codes/:code", get(groups::get_group_by_code))
        // Members
        .route(
            "/api/v1/groups/:group_id/members",
            post(members::join_group).get(members::list_members),
        )
        .route(
            "/api/v1/members/:member_id",
            get(members::get_member).delete(members::leave_group),
        )
        .route(
            "/api/v1/members/:member_id/location",
            put(members::update_location),
        )
        .route(
            "/api/v1/members/:member_id/status",
            put(members::update_status),
        )
        // Messages and pings
        .route(
            "/api/v1/groups/:group_id/messages",
            post(messages::send_message).get(messages::list_messages),
        )
        .route(
            "/api/v1/groups/:group_id/pings",
            post(pings::send_ping).get(pings::list_pings),
        );

    let public_routes = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
