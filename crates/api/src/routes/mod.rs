//! HTTP route handlers.

pub mod groups;
pub mod health;
pub mod members;
pub mod messages;
pub mod pings;
