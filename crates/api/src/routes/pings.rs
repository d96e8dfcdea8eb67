//! Ping routes.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::ping::{ListPingsQuery, SendPingRequest};
use domain::models::Ping;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery, ValidatedJson};

/// Send a ping to one member, or to the whole group when `toMemberId` is
/// absent. Every connection in the group receives it.
///
/// POST /api/v1/groups/:group_id/pings
pub async fn send_ping(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<SendPingRequest>,
) -> Result<(StatusCode, Json<Ping>), ApiError> {
    let ping = state.sessions.send_ping(group_id, request).await?;
    Ok((StatusCode::CREATED, Json(ping)))
}

/// Recent pings, newest first.
///
/// GET /api/v1/groups/:group_id/pings?limit=N
pub async fn list_pings(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListPingsQuery>,
) -> Result<Json<Vec<Ping>>, ApiError> {
    let pings = state
        .sessions
        .recent_pings(group_id, query.effective_limit())
        .await?;
    Ok(Json(pings))
}
