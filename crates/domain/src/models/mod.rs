//! Domain models for Group Trek.

pub mod events;
pub mod group;
pub mod member;
pub mod message;
pub mod ping;

pub use events::{ClientEvent, ServerEvent};
pub use group::Group;
pub use member::{Member, MemberDistance, MemberStatus, MemberView};
pub use message::{Message, MessageType};
pub use ping::Ping;
