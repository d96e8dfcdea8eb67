//! Ping repository for database operations.

use domain::models::ping::NewPing;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PingEntity;
use crate::metrics::StoreTimer;

/// Repository for ping-related database operations.
#[derive(Clone)]
pub struct PingRepository {
    pool: PgPool,
}

impl PingRepository {
    /// Creates a new PingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a ping.
    pub async fn create(&self, ping: &NewPing) -> Result<PingEntity, sqlx::Error> {
        let timer = StoreTimer::postgres("create_ping");
        let result = sqlx::query_as::<_, PingEntity>(
            r#"
            INSERT INTO pings (id, group_id, from_member_id, to_member_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, group_id, from_member_id, to_member_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ping.group_id)
        .bind(ping.from_member_id)
        .bind(ping.to_member_id)
        .bind(ping.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The most recent `limit` pings of a group, newest first.
    pub async fn find_recent(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PingEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("recent_pings");
        let result = sqlx::query_as::<_, PingEntity>(
            r#"
            SELECT id, group_id, from_member_id, to_member_id, created_at
            FROM pings
            WHERE group_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(group_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
