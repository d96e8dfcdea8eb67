//! Member domain models.

use chrono::{DateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Presence status of a member.
///
/// Any status may move to any other; the triggers live in
/// [`crate::services::presence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Active,
    Paused,
    Offline,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Paused => "paused",
            MemberStatus::Offline => "offline",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(MemberStatus::Active),
            "paused" => Ok(MemberStatus::Paused),
            "offline" => Ok(MemberStatus::Offline),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One participant's presence record within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub status: MemberStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: DateTime<Utc>,
    pub location_sharing: bool,
    pub ping_enabled: bool,
    /// Id of the live connection bound to this member, if any.
    pub connection_handle: Option<Uuid>,
}

impl Member {
    /// The member's last known position, `None` until the first sample.
    pub fn position(&self) -> Option<Point<f64>> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Point::new(lon, lat)),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_handle.is_some()
    }
}

/// Distance from one member to another, in whole meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDistance {
    pub member_id: Uuid,
    pub distance_meters: i64,
}

/// A member together with the distances to every other located member of
/// its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    pub distances: Vec<MemberDistance>,
}

impl MemberView {
    pub fn id(&self) -> Uuid {
        self.member.id
    }
}

impl From<Member> for MemberView {
    fn from(member: Member) -> Self {
        Self {
            member,
            distances: Vec::new(),
        }
    }
}

/// Data needed to insert a member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub group_id: Uuid,
    pub name: String,
    pub status: MemberStatus,
    pub location_sharing: bool,
    pub ping_enabled: bool,
    pub last_seen: DateTime<Utc>,
}

impl NewMember {
    pub fn new(group_id: Uuid, request: CreateMemberRequest, now: DateTime<Utc>) -> Self {
        Self {
            group_id,
            name: request.name.trim().to_string(),
            status: request.status.unwrap_or_default(),
            location_sharing: true,
            ping_enabled: true,
            last_seen: now,
        }
    }
}

/// Request payload for joining a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    #[validate(
        length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    pub status: Option<MemberStatus>,
}

/// Request payload for a location sample.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

/// Request payload for an explicit status change.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: MemberStatus,
    pub location_sharing: Option<bool>,
    pub ping_enabled: Option<bool>,
}
