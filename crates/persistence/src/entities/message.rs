//! Message entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::MessageType;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for message_type that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "message_type", rename_all = "snake_case")]
pub enum MessageTypeDb {
    Text,
    QuickMessage,
}

impl From<MessageTypeDb> for MessageType {
    fn from(db_type: MessageTypeDb) -> Self {
        match db_type {
            MessageTypeDb::Text => MessageType::Text,
            MessageTypeDb::QuickMessage => MessageType::QuickMessage,
        }
    }
}

impl From<MessageType> for MessageTypeDb {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Text => MessageTypeDb::Text,
            MessageType::QuickMessage => MessageTypeDb::QuickMessage,
        }
    }
}

/// Database row mapping for the messages table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub content: String,
    #[sqlx(rename = "type")]
    pub message_type: MessageTypeDb,
    pub created_at: DateTime<Utc>,
}

impl From<MessageEntity> for domain::models::Message {
    fn from(entity: MessageEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            member_id: entity.member_id,
            content: entity.content,
            message_type: entity.message_type.into(),
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_db_conversion() {
        assert_eq!(
            MessageType::from(MessageTypeDb::QuickMessage),
            MessageType::QuickMessage
        );
        assert_eq!(MessageTypeDb::from(MessageType::Text), MessageTypeDb::Text);
    }
}
