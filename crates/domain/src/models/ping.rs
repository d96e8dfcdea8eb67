//! Ping domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A lightweight attention request. A ping without a target is meant for
/// the whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Ping {
    /// True when `member_id` should react to this ping.
    pub fn is_addressed_to(&self, member_id: Uuid) -> bool {
        self.to_member_id.map_or(true, |to| to == member_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewPing {
    pub group_id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for sending a ping.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendPingRequest {
    pub from_member_id: Uuid,
    pub to_member_id: Option<Uuid>,
}

impl SendPingRequest {
    pub fn into_new_ping(self, group_id: Uuid, now: DateTime<Utc>) -> NewPing {
        NewPing {
            group_id,
            from_member_id: self.from_member_id,
            to_member_id: self.to_member_id,
            created_at: now,
        }
    }
}

/// Query parameters for listing recent pings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPingsQuery {
    pub limit: Option<i64>,
}

impl ListPingsQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;
    pub const MIN_LIMIT: i64 = 1;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(Self::MIN_LIMIT, Self::MAX_LIMIT)
    }
}
