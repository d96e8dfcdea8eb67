//! Member repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::member::NewMember;
use domain::models::Member;
use domain::services::MemberChange;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{MemberEntity, MemberStatusDb};
use crate::metrics::StoreTimer;

const MEMBER_COLUMNS: &str = "id, group_id, name, status, latitude, longitude, last_seen, \
                              location_sharing, ping_enabled, connection_handle";

/// Repository for member-related database operations.
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    /// Creates a new MemberRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new member.
    pub async fn create(&self, member: &NewMember) -> Result<MemberEntity, sqlx::Error> {
        let timer = StoreTimer::postgres("create_member");
        let query = format!(
            r#"
            INSERT INTO members (id, group_id, name, status, last_seen, location_sharing, ping_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEMBER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, MemberEntity>(&query)
            .bind(Uuid::new_v4())
            .bind(member.group_id)
            .bind(&member.name)
            .bind(MemberStatusDb::from(member.status))
            .bind(member.last_seen)
            .bind(member.location_sharing)
            .bind(member.ping_enabled)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find a member by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MemberEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("find_member");
        let query = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1");
        let result = sqlx::query_as::<_, MemberEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// List the members of a group ordered by name.
    pub async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<MemberEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("list_members");
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE group_id = $1 ORDER BY name, id"
        );
        let result = sqlx::query_as::<_, MemberEntity>(&query)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Apply a presence change under a row lock.
    pub async fn apply_change(
        &self,
        id: Uuid,
        change: &MemberChange,
        now: DateTime<Utc>,
    ) -> Result<Option<MemberEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("update_member");
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, MemberEntity>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        let mut member: Member = current.into();
        change.apply(&mut member, now);

        let update = format!(
            r#"
            UPDATE members
            SET status = $2, latitude = $3, longitude = $4, last_seen = $5,
                location_sharing = $6, ping_enabled = $7, connection_handle = $8
            WHERE id = $1
            RETURNING {MEMBER_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, MemberEntity>(&update)
            .bind(member.id)
            .bind(MemberStatusDb::from(member.status))
            .bind(member.latitude)
            .bind(member.longitude)
            .bind(member.last_seen)
            .bind(member.location_sharing)
            .bind(member.ping_enabled)
            .bind(member.connection_handle)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some(updated))
    }

    /// Delete a member, returning the removed row.
    pub async fn delete(&self, id: Uuid) -> Result<Option<MemberEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("delete_member");
        let query = format!("DELETE FROM members WHERE id = $1 RETURNING {MEMBER_COLUMNS}");
        let result = sqlx::query_as::<_, MemberEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }
}
