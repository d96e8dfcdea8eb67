//! Persistence layer for Group Trek.
//!
//! This crate contains:
//! - The `RecordStore` capability and its in-memory and PostgreSQL backends
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::{MemoryStore, PgStore, PurgeSummary, RecordStore, StoreError};
