//! Group chat routes.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::message::{ListMessagesQuery, SendMessageRequest};
use domain::models::Message;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery, ValidatedJson};

/// POST /api/v1/groups/:group_id/messages
pub async fn send_message(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state.sessions.send_message(group_id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Recent messages, oldest first.
///
/// GET /api/v1/groups/:group_id/messages?limit=N
pub async fn list_messages(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListMessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state
        .sessions
        .recent_messages(group_id, query.effective_limit())
        .await?;
    Ok(Json(messages))
}
