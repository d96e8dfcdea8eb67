//! Process-local record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use domain::models::group::NewGroup;
use domain::models::member::NewMember;
use domain::models::message::NewMessage;
use domain::models::ping::NewPing;
use domain::models::{Group, Member, Message, Ping};
use domain::services::MemberChange;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{PurgeSummary, RecordStore, StoreError};
use crate::metrics::{StoreTimer, MEMORY_BACKEND};

#[derive(Default)]
struct Tables {
    groups: HashMap<Uuid, Group>,
    codes: HashMap<String, Uuid>,
    members: HashMap<Uuid, Member>,
    /// Per group, in insertion order.
    messages: HashMap<Uuid, Vec<Message>>,
    /// Per group, in insertion order.
    pings: HashMap<Uuid, Vec<Ping>>,
}

/// Record store kept in process memory.
///
/// The lock is never held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with [`StoreError::Unavailable`] until
    /// switched back. Used to exercise outage handling.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        MEMORY_BACKEND
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("create_group");
        let mut tables = self.tables.write();

        if tables.codes.contains_key(&group.code) {
            return Err(StoreError::DuplicateCode(group.code));
        }

        let group = Group {
            id: Uuid::new_v4(),
            name: group.name,
            code: group.code,
            created_at: group.created_at,
            expires_at: group.expires_at,
        };
        tables.codes.insert(group.code.clone(), group.id);
        tables.groups.insert(group.id, group.clone());
        drop(tables);
        timer.record();
        Ok(group)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<Group>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("find_group");
        let group = self.tables.read().groups.get(&id).cloned();
        timer.record();
        Ok(group)
    }

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("find_group_by_code");
        let tables = self.tables.read();
        let group = tables
            .codes
            .get(code)
            .and_then(|id| tables.groups.get(id))
            .cloned();
        drop(tables);
        timer.record();
        Ok(group)
    }

    async fn list_expired_groups(&self, now: DateTime<Utc>) -> Result<Vec<Group>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("list_expired_groups");
        let expired = self
            .tables
            .read()
            .groups
            .values()
            .filter(|g| g.is_expired_at(now))
            .cloned()
            .collect();
        timer.record();
        Ok(expired)
    }

    async fn delete_group_cascade(&self, id: Uuid) -> Result<PurgeSummary, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("delete_group_cascade");
        let mut tables = self.tables.write();

        let messages = tables.messages.remove(&id).map_or(0, |m| m.len() as u64);
        let pings = tables.pings.remove(&id).map_or(0, |p| p.len() as u64);
        let before = tables.members.len();
        tables.members.retain(|_, m| m.group_id != id);
        let members = (before - tables.members.len()) as u64;

        let group_deleted = match tables.groups.remove(&id) {
            Some(group) => {
                tables.codes.remove(&group.code);
                true
            }
            None => false,
        };
        drop(tables);
        timer.record();

        Ok(PurgeSummary {
            group_deleted,
            members,
            messages,
            pings,
        })
    }

    async fn create_member(&self, member: NewMember) -> Result<Member, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("create_member");
        let member = Member {
            id: Uuid::new_v4(),
            group_id: member.group_id,
            name: member.name,
            status: member.status,
            latitude: None,
            longitude: None,
            last_seen: member.last_seen,
            location_sharing: member.location_sharing,
            ping_enabled: member.ping_enabled,
            connection_handle: None,
        };
        self.tables.write().members.insert(member.id, member.clone());
        timer.record();
        Ok(member)
    }

    async fn find_member(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("find_member");
        let member = self.tables.read().members.get(&id).cloned();
        timer.record();
        Ok(member)
    }

    async fn list_members(&self, group_id: Uuid) -> Result<Vec<Member>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("list_members");
        let mut members: Vec<Member> = self
            .tables
            .read()
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        timer.record();
        Ok(members)
    }

    async fn update_member(
        &self,
        id: Uuid,
        change: MemberChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Member>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("update_member");
        let updated = self.tables.write().members.get_mut(&id).map(|member| {
            change.apply(member, now);
            member.clone()
        });
        timer.record();
        Ok(updated)
    }

    async fn delete_member(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("delete_member");
        let removed = self.tables.write().members.remove(&id);
        timer.record();
        Ok(removed)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("create_message");
        let message = Message {
            id: Uuid::new_v4(),
            group_id: message.group_id,
            member_id: message.member_id,
            content: message.content,
            message_type: message.message_type,
            created_at: message.created_at,
        };
        self.tables
            .write()
            .messages
            .entry(message.group_id)
            .or_default()
            .push(message.clone());
        timer.record();
        Ok(message)
    }

    async fn recent_messages(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("recent_messages");
        let limit = limit.max(0) as usize;
        let recent = self
            .tables
            .read()
            .messages
            .get(&group_id)
            .map(|all| all[all.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default();
        timer.record();
        Ok(recent)
    }

    async fn create_ping(&self, ping: NewPing) -> Result<Ping, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("create_ping");
        let ping = Ping {
            id: Uuid::new_v4(),
            group_id: ping.group_id,
            from_member_id: ping.from_member_id,
            to_member_id: ping.to_member_id,
            created_at: ping.created_at,
        };
        self.tables
            .write()
            .pings
            .entry(ping.group_id)
            .or_default()
            .push(ping.clone());
        timer.record();
        Ok(ping)
    }

    async fn recent_pings(&self, group_id: Uuid, limit: i64) -> Result<Vec<Ping>, StoreError> {
        self.check_available()?;
        let timer = StoreTimer::memory("recent_pings");
        let limit = limit.max(0) as usize;
        let recent = self
            .tables
            .read()
            .pings
            .get(&group_id)
            .map(|all| all.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default();
        timer.record();
        Ok(recent)
    }
}
