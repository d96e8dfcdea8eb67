//! Member routes: joining, presence updates and leaving.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::member::{CreateMemberRequest, UpdateLocationRequest, UpdateStatusRequest};
use domain::models::{Member, MemberView};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ValidatedJson};

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub success: bool,
}

/// Join a group.
///
/// POST /api/v1/groups/:group_id/members
pub async fn join_group(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let member = state.sessions.join(group_id, request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// List a group's members with pairwise distances.
///
/// GET /api/v1/groups/:group_id/members
pub async fn list_members(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    Ok(Json(state.sessions.list_members(group_id).await?))
}

/// GET /api/v1/members/:member_id
pub async fn get_member(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<Uuid>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.sessions.member(member_id).await?))
}

/// Record a location sample. Status is left unchanged.
///
/// PUT /api/v1/members/:member_id/location
pub async fn update_location(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateLocationRequest>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.sessions.update_location(member_id, request).await?))
}

/// PUT /api/v1/members/:member_id/status
pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.sessions.update_status(member_id, request).await?))
}

/// Leave the group. The member record is deleted; its messages and pings
/// stay.
///
/// DELETE /api/v1/members/:member_id
pub async fn leave_group(
    State(state): State<AppState>,
    ApiPath(member_id): ApiPath<Uuid>,
) -> Result<Json<LeaveResponse>, ApiError> {
    state.sessions.leave(member_id).await?;
    Ok(Json(LeaveResponse { success: true }))
}
