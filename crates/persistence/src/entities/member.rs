//! Member entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::MemberStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for member_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
pub enum MemberStatusDb {
    Active,
    Paused,
    Offline,
}

impl From<MemberStatusDb> for MemberStatus {
    fn from(db_status: MemberStatusDb) -> Self {
        match db_status {
            MemberStatusDb::Active => MemberStatus::Active,
            MemberStatusDb::Paused => MemberStatus::Paused,
            MemberStatusDb::Offline => MemberStatus::Offline,
        }
    }
}

impl From<MemberStatus> for MemberStatusDb {
    fn from(status: MemberStatus) -> Self {
        match status {
            MemberStatus::Active => MemberStatusDb::Active,
            MemberStatus::Paused => MemberStatusDb::Paused,
            MemberStatus::Offline => MemberStatusDb::Offline,
        }
    }
}

/// Database row mapping for the members table.
#[derive(Debug, Clone, FromRow)]
pub struct MemberEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub status: MemberStatusDb,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_seen: DateTime<Utc>,
    pub location_sharing: bool,
    pub ping_enabled: bool,
    pub connection_handle: Option<Uuid>,
}

impl From<MemberEntity> for domain::models::Member {
    fn from(entity: MemberEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            name: entity.name,
            status: entity.status.into(),
            latitude: entity.latitude,
            longitude: entity.longitude,
            last_seen: entity.last_seen,
            location_sharing: entity.location_sharing,
            ping_enabled: entity.ping_enabled,
            connection_handle: entity.connection_handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Member;

    #[test]
    fn test_member_status_db_round_trip() {
        for status in [
            MemberStatus::Active,
            MemberStatus::Paused,
            MemberStatus::Offline,
        ] {
            let db: MemberStatusDb = status.into();
            assert_eq!(MemberStatus::from(db), status);
        }
    }

    #[test]
    fn test_member_entity_to_domain() {
        let entity = MemberEntity {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            name: "Bob".to_string(),
            status: MemberStatusDb::Paused,
            latitude: Some(12.243),
            longitude: Some(79.32),
            last_seen: Utc::now(),
            location_sharing: false,
            ping_enabled: true,
            connection_handle: None,
        };

        let member: Member = entity.into();
        assert_eq!(member.status, MemberStatus::Paused);
        assert!(!member.location_sharing);
        assert!(member.position().is_some());
    }
}
