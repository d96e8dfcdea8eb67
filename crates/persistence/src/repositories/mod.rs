//! Repository implementations for database operations.

pub mod group;
pub mod member;
pub mod message;
pub mod ping;

pub use group::GroupRepository;
pub use member::MemberRepository;
pub use message::MessageRepository;
pub use ping::PingRepository;
