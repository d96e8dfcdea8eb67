//! Group entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<GroupEntity> for domain::models::Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            code: entity.code,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::Group;

    #[test]
    fn test_group_entity_to_domain() {
        let now = Utc::now();
        let entity = GroupEntity {
            id: Uuid::new_v4(),
            name: "Trek".to_string(),
            code: "GRT-4821".to_string(),
            created_at: now,
            expires_at: now + Duration::hours(24),
        };
        let id = entity.id;

        let group: Group = entity.into();
        assert_eq!(group.id, id);
        assert_eq!(group.code, "GRT-4821");
        assert!(!group.is_expired_at(now));
    }
}
