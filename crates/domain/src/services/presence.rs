//! Member presence transitions.
//!
//! Every status may move to any other. What differs between triggers is
//! which fields they touch; all of them refresh `last_seen`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::member::{UpdateLocationRequest, UpdateStatusRequest};
use crate::models::{Member, MemberStatus};

/// A single mutation of a member's presence record.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberChange {
    /// New location sample. Status is left alone.
    Location { latitude: f64, longitude: f64 },
    /// Explicit status change, optionally toggling sharing preferences.
    Status {
        status: MemberStatus,
        location_sharing: Option<bool>,
        ping_enabled: Option<bool>,
    },
    /// A live connection was bound. Status is left alone.
    Connected { connection_id: Uuid },
    /// The live connection went away.
    Disconnected,
}

impl MemberChange {
    /// Applies the change in place.
    pub fn apply(&self, member: &mut Member, now: DateTime<Utc>) {
        match *self {
            MemberChange::Location {
                latitude,
                longitude,
            } => {
                member.latitude = Some(latitude);
                member.longitude = Some(longitude);
            }
            MemberChange::Status {
                status,
                location_sharing,
                ping_enabled,
            } => {
                member.status = status;
                if let Some(sharing) = location_sharing {
                    member.location_sharing = sharing;
                }
                if let Some(enabled) = ping_enabled {
                    member.ping_enabled = enabled;
                }
            }
            MemberChange::Connected { connection_id } => {
                member.connection_handle = Some(connection_id);
            }
            MemberChange::Disconnected => {
                member.status = MemberStatus::Offline;
                member.connection_handle = None;
            }
        }
        member.last_seen = now;
    }

    /// Short name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MemberChange::Location { .. } => "location",
            MemberChange::Status { .. } => "status",
            MemberChange::Connected { .. } => "connected",
            MemberChange::Disconnected => "disconnected",
        }
    }
}

impl From<UpdateLocationRequest> for MemberChange {
    fn from(request: UpdateLocationRequest) -> Self {
        MemberChange::Location {
            latitude: request.latitude,
            longitude: request.longitude,
        }
    }
}

impl From<UpdateStatusRequest> for MemberChange {
    fn from(request: UpdateStatusRequest) -> Self {
        MemberChange::Status {
            status: request.status,
            location_sharing: request.location_sharing,
            ping_enabled: request.ping_enabled,
        }
    }
}
