//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod group;
pub mod member;
pub mod message;
pub mod ping;

pub use group::GroupEntity;
pub use member::{MemberEntity, MemberStatusDb};
pub use message::{MessageEntity, MessageTypeDb};
pub use ping::PingEntity;
