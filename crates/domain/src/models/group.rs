//! Group domain model.
//!
//! A group is a time-boxed walking party. People find it by its join code
//! and it disappears, together with everything posted into it, once it
//! expires.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Default time-to-live for new groups.
pub const DEFAULT_GROUP_TTL_HOURS: i64 = 24;

/// Represents a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Group {
    /// A group is expired once `expires_at` lies strictly in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Data needed to insert a group. The id and creation time are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewGroup {
    /// Builds a group that expires `ttl` after `now`.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Request payload for creating a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,
}
