//! PostgreSQL-backed record store.

use chrono::{DateTime, Utc};
use domain::models::group::NewGroup;
use domain::models::member::NewMember;
use domain::models::message::NewMessage;
use domain::models::ping::NewPing;
use domain::models::{Group, Member, Message, Ping};
use domain::services::MemberChange;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PurgeSummary, RecordStore, StoreError};
use crate::metrics::{record_pool_metrics, POSTGRES_BACKEND};
use crate::repositories::{GroupRepository, MemberRepository, MessageRepository, PingRepository};

const UNIQUE_VIOLATION: &str = "23505";
const CODE_CONSTRAINT: &str = "groups_code_unique";

/// Record store on top of the sqlx repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    groups: GroupRepository,
    members: MemberRepository,
    messages: MessageRepository,
    pings: PingRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            pings: PingRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_code_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db.constraint().map_or(true, |c| c == CODE_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait::async_trait]
impl RecordStore for PgStore {
    fn backend_name(&self) -> &'static str {
        POSTGRES_BACKEND
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        record_pool_metrics(&self.pool);
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        self.groups
            .create(&group.name, &group.code, group.created_at, group.expires_at)
            .await
            .map(Into::into)
            .map_err(|err| {
                if is_code_conflict(&err) {
                    StoreError::DuplicateCode(group.code.clone())
                } else {
                    StoreError::Backend(err)
                }
            })
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.find_by_id(id).await?.map(Into::into))
    }

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups.find_by_code(code).await?.map(Into::into))
    }

    async fn list_expired_groups(&self, now: DateTime<Utc>) -> Result<Vec<Group>, StoreError> {
        let groups = self.groups.find_expired(now).await?;
        Ok(groups.into_iter().map(Into::into).collect())
    }

    async fn delete_group_cascade(&self, id: Uuid) -> Result<PurgeSummary, StoreError> {
        Ok(self.groups.delete_cascade(id).await?)
    }

    async fn create_member(&self, member: NewMember) -> Result<Member, StoreError> {
        Ok(self.members.create(&member).await?.into())
    }

    async fn find_member(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
        Ok(self.members.find_by_id(id).await?.map(Into::into))
    }

    async fn list_members(&self, group_id: Uuid) -> Result<Vec<Member>, StoreError> {
        let members = self.members.find_by_group(group_id).await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    async fn update_member(
        &self,
        id: Uuid,
        change: MemberChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Member>, StoreError> {
        Ok(self
            .members
            .apply_change(id, &change, now)
            .await?
            .map(Into::into))
    }

    async fn delete_member(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
        Ok(self.members.delete(id).await?.map(Into::into))
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        Ok(self.messages.create(&message).await?.into())
    }

    async fn recent_messages(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.find_recent(group_id, limit).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn create_ping(&self, ping: NewPing) -> Result<Ping, StoreError> {
        Ok(self.pings.create(&ping).await?.into())
    }

    async fn recent_pings(&self, group_id: Uuid, limit: i64) -> Result<Vec<Ping>, StoreError> {
        let pings = self.pings.find_recent(group_id, limit).await?;
        Ok(pings.into_iter().map(Into::into).collect())
    }
}
