//! Ping entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the pings table.
#[derive(Debug, Clone, FromRow)]
pub struct PingEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<PingEntity> for domain::models::Ping {
    fn from(entity: PingEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            from_member_id: entity.from_member_id,
            to_member_id: entity.to_member_id,
            created_at: entity.created_at,
        }
    }
}
