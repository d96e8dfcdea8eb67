//! Record store capability.
//!
//! The service only needs create/read/update/delete per entity plus lookups
//! by group. Two interchangeable backends implement it: [`MemoryStore`] for
//! single-process deployments and tests, and [`PgStore`] on PostgreSQL.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use domain::models::group::NewGroup;
use domain::models::member::NewMember;
use domain::models::message::NewMessage;
use domain::models::ping::NewPing;
use domain::models::{Group, Member, Message, Ping};
use domain::services::MemberChange;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another group already holds this join code.
    #[error("join code {0} is already in use")]
    DuplicateCode(String),

    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),

    /// The store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True for failures that may succeed when retried.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::DuplicateCode(_) => false,
            StoreError::Unavailable(_) => true,
            StoreError::Backend(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::WorkerCrashed
            ),
        }
    }
}

/// What a group purge removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub group_deleted: bool,
    pub members: u64,
    pub messages: u64,
    pub pings: u64,
}

/// Key-addressable storage for groups, members, messages and pings.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name used in logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Verifies the backend can serve requests.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Inserts a group. Fails with [`StoreError::DuplicateCode`] if any
    /// stored group, expired or not, already uses the code.
    async fn create_group(&self, group: NewGroup) -> Result<Group, StoreError>;

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>, StoreError>;

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, StoreError>;

    /// Groups whose `expires_at` is before `now`.
    async fn list_expired_groups(&self, now: DateTime<Utc>) -> Result<Vec<Group>, StoreError>;

    /// Deletes a group with its messages, pings and members in one step.
    async fn delete_group_cascade(&self, id: Uuid) -> Result<PurgeSummary, StoreError>;

    async fn create_member(&self, member: NewMember) -> Result<Member, StoreError>;

    async fn find_member(&self, id: Uuid) -> Result<Option<Member>, StoreError>;

    async fn list_members(&self, group_id: Uuid) -> Result<Vec<Member>, StoreError>;

    /// Applies `change` to the member and returns the updated record, or
    /// `None` if the member does not exist.
    async fn update_member(
        &self,
        id: Uuid,
        change: MemberChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Member>, StoreError>;

    /// Deletes a member and returns the removed record.
    async fn delete_member(&self, id: Uuid) -> Result<Option<Member>, StoreError>;

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// The `limit` most recent messages of a group, oldest first.
    async fn recent_messages(&self, group_id: Uuid, limit: i64)
        -> Result<Vec<Message>, StoreError>;

    async fn create_ping(&self, ping: NewPing) -> Result<Ping, StoreError>;

    /// The `limit` most recent pings of a group, newest first.
    async fn recent_pings(&self, group_id: Uuid, limit: i64) -> Result<Vec<Ping>, StoreError>;
}
