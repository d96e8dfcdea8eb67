//! Group repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GroupEntity;
use crate::metrics::StoreTimer;
use crate::store::PurgeSummary;

/// Repository for group-related database operations.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new group. A taken code surfaces as a unique violation on
    /// `groups_code_unique`.
    pub async fn create(
        &self,
        name: &str,
        code: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<GroupEntity, sqlx::Error> {
        let timer = StoreTimer::postgres("create_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (id, name, code, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, code, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("find_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, code, created_at, expires_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a group by its join code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<GroupEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("find_group_by_code");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, code, created_at, expires_at
            FROM groups
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List groups that expired before `now`.
    pub async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<GroupEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("list_expired_groups");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, code, created_at, expires_at
            FROM groups
            WHERE expires_at < $1
            ORDER BY expires_at
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a group and everything that belongs to it in one transaction.
    pub async fn delete_cascade(&self, id: Uuid) -> Result<PurgeSummary, sqlx::Error> {
        let timer = StoreTimer::postgres("delete_group_cascade");
        let mut tx = self.pool.begin().await?;

        let messages = sqlx::query("DELETE FROM messages WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let pings = sqlx::query("DELETE FROM pings WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let members = sqlx::query("DELETE FROM members WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let groups = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        timer.record();

        tracing::debug!(
            group_id = %id,
            members,
            messages,
            pings,
            "Group purged"
        );

        Ok(PurgeSummary {
            group_deleted: groups > 0,
            members,
            messages,
            pings,
        })
    }
}
