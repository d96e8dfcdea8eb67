//! Message repository for database operations.

use domain::models::message::NewMessage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{MessageEntity, MessageTypeDb};
use crate::metrics::StoreTimer;

/// Repository for message-related database operations.
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Creates a new MessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a message.
    pub async fn create(&self, message: &NewMessage) -> Result<MessageEntity, sqlx::Error> {
        let timer = StoreTimer::postgres("create_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages (id, group_id, member_id, content, type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, group_id, member_id, content, type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.group_id)
        .bind(message.member_id)
        .bind(&message.content)
        .bind(MessageTypeDb::from(message.message_type))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The most recent `limit` messages of a group, oldest first.
    pub async fn find_recent(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, sqlx::Error> {
        let timer = StoreTimer::postgres("recent_messages");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT id, group_id, member_id, content, type, created_at
            FROM (
                SELECT id, group_id, member_id, content, type, created_at
                FROM messages
                WHERE group_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, id ASC
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
