//! Realtime wire protocol.
//!
//! Every frame is a JSON object with a `type` discriminator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Message, MemberView, Ping};

/// Event pushed from the server to every connection of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full state of one member. Receivers replace their copy wholesale.
    MemberUpdated { member: MemberView },
    NewMessage { message: Message },
    NewPing { ping: Ping },
    /// The member is gone; nothing but the id is sent.
    MemberLeft {
        #[serde(rename = "memberId")]
        member_id: Uuid,
    },
}

impl ServerEvent {
    /// Stable event name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::MemberUpdated { .. } => "member_updated",
            ServerEvent::NewMessage { .. } => "new_message",
            ServerEvent::NewPing { .. } => "new_ping",
            ServerEvent::MemberLeft { .. } => "member_left",
        }
    }
}

/// Frame sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Binds the connection to a member.
    Join {
        #[serde(rename = "memberId")]
        member_id: Uuid,
    },
    #[serde(other)]
    Unknown,
}
