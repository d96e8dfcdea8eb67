//! Domain layer for Group Trek.
//!
//! This crate contains:
//! - Domain models (Group, Member, Message, Ping) and request payloads
//! - The realtime wire protocol (`ServerEvent`, `ClientEvent`)
//! - Pure services: distances, presence transitions, client view reconciliation

pub mod models;
pub mod services;
