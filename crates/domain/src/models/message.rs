//! Chat message domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Kind of chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    /// One of the canned one-tap messages ("Wait for me", "All good").
    QuickMessage,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::QuickMessage => "quick_message",
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "quick_message" => Ok(MessageType::QuickMessage),
            _ => Err(format!("Invalid message type: {}", s)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

/// Request payload for posting a message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub member_id: Uuid,

    #[validate(
        length(min = 1, max = 1000, message = "Content must be between 1 and 1000 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub content: String,

    #[serde(rename = "type")]
    pub message_type: Option<MessageType>,
}

impl SendMessageRequest {
    pub fn into_new_message(self, group_id: Uuid, now: DateTime<Utc>) -> NewMessage {
        NewMessage {
            group_id,
            member_id: self.member_id,
            content: self.content,
            message_type: self.message_type.unwrap_or_default(),
            created_at: now,
        }
    }
}

/// Query parameters for listing recent messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
}

impl ListMessagesQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;
    pub const MIN_LIMIT: i64 = 1;

    /// Returns the limit clamped to the allowed range.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(Self::MIN_LIMIT, Self::MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_serialization() {
        assert_eq!(
            serde_json::to_string(&MessageType::QuickMessage).unwrap(),
            "\"quick_message\""
        );
        assert_eq!(serde_json::to_string(&MessageType::Text).unwrap(), "\"text\"");
        assert_eq!("quick_message".parse::<MessageType>(), Ok(MessageType::QuickMessage));
        assert!("shout".parse::<MessageType>().is_err());
    }

    #[test]
    fn test_message_uses_type_field() {
        let message = Message {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            content: "Wait for me".to_string(),
            message_type: MessageType::QuickMessage,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "quick_message");
        assert!(json.get("memberId").is_some());
        assert!(json.get("messageType").is_none());
    }

    #[test]
    fn test_send_message_request_defaults_to_text() {
        let json = r#"{"memberId":"550e8400-e29b-41d4-a716-446655440000","content":"hi"}"#;
        let request: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_ok());

        let new_message = request.into_new_message(Uuid::new_v4(), Utc::now());
        assert_eq!(new_message.message_type, MessageType::Text);
        assert_eq!(new_message.content, "hi");
    }

    #[test]
    fn test_send_message_request_validation() {
        let blank = SendMessageRequest {
            member_id: Uuid::new_v4(),
            content: " \n ".to_string(),
            message_type: None,
        };
        assert!(blank.validate().is_err());

        let long = SendMessageRequest {
            member_id: Uuid::new_v4(),
            content: "a".repeat(1001),
            message_type: Some(MessageType::Text),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_list_messages_effective_limit() {
        assert_eq!(ListMessagesQuery::default().effective_limit(), 50);
        assert_eq!(ListMessagesQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(ListMessagesQuery { limit: Some(10) }.effective_limit(), 10);
        assert_eq!(ListMessagesQuery { limit: Some(5000) }.effective_limit(), 200);
    }
}
