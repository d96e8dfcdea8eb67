//! Group routes: creation and lookup by id or join code.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::group::CreateGroupRequest;
use domain::models::Group;
use shared::codes::normalize_join_code;
use shared::validation::validate_join_code;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ValidatedJson};

/// Create a new group with a generated join code.
///
/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state.sessions.create_group(request).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Fetch a live group by id.
///
/// GET /api/v1/groups/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<Uuid>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.sessions.group(group_id).await?))
}

/// Fetch a live group by join code.
///
/// GET /api/v1/codes/:code
pub async fn get_group_by_code(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<Group>, ApiError> {
    validate_join_code(&normalize_join_code(&code)).map_err(|err| {
        ApiError::Validation(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("'{}' is not a valid join code", code)),
        )
    })?;
    Ok(Json(state.sessions.group_by_code(&code).await?))
}
