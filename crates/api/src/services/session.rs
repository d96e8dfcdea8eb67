//! Per-action orchestration of store writes and group fan-out.
//!
//! Every successful write is followed by exactly one broadcast, issued
//! while the entity lock that guarded the write is still held. Member
//! mutations lock the member, so peers see one member's updates in commit
//! order. Appends and joins lock the group, which is also what the expiry
//! sweep takes before purging. Binding a connection takes both, member
//! first; nothing takes them in the other order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::models::group::CreateGroupRequest;
use domain::models::member::{
    CreateMemberRequest, NewMember, UpdateLocationRequest, UpdateStatusRequest,
};
use domain::models::message::SendMessageRequest;
use domain::models::ping::SendPingRequest;
use domain::models::{Group, Member, MemberView, Message, Ping, ServerEvent};
use domain::services::{attach_distances, view_of, MemberChange};
use persistence::RecordStore;
use uuid::Uuid;

use super::{retry_read, EntityLocks, GroupLifecycle, SessionError};
use crate::config::GroupsConfig;
use crate::realtime::{BroadcastReport, ConnectionHandle, ConnectionRegistry};

#[derive(Clone)]
pub struct SessionCoordinator {
    store: Arc<dyn RecordStore>,
    registry: ConnectionRegistry,
    lifecycle: GroupLifecycle,
    member_locks: EntityLocks,
    group_locks: EntityLocks,
}

impl SessionCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, groups: &GroupsConfig) -> Self {
        let registry = ConnectionRegistry::new();
        let group_locks = EntityLocks::new();
        let lifecycle =
            GroupLifecycle::new(store.clone(), registry.clone(), group_locks.clone(), groups);

        Self {
            store,
            registry,
            lifecycle,
            member_locks: EntityLocks::new(),
            group_locks,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group, SessionError> {
        self.lifecycle.create_group(&request.name).await
    }

    pub async fn group(&self, group_id: Uuid) -> Result<Group, SessionError> {
        self.lifecycle.get_group(group_id).await
    }

    pub async fn group_by_code(&self, code: &str) -> Result<Group, SessionError> {
        self.lifecycle.get_group_by_code(code).await
    }

    /// Adds a member to a live group and announces it.
    pub async fn join(
        &self,
        group_id: Uuid,
        request: CreateMemberRequest,
    ) -> Result<Member, SessionError> {
        let _guard = self.group_locks.acquire(group_id).await;
        self.lifecycle.get_group(group_id).await?;

        let member = self
            .store
            .create_member(NewMember::new(group_id, request, Utc::now()))
            .await?;

        tracing::info!(
            group_id = %group_id,
            member_id = %member.id,
            status = %member.status,
            "Member joined"
        );

        self.publish_member(member.clone()).await;
        Ok(member)
    }

    /// Members of a live group with their pairwise distances.
    pub async fn list_members(&self, group_id: Uuid) -> Result<Vec<MemberView>, SessionError> {
        self.lifecycle.get_group(group_id).await?;
        let store = &self.store;
        let members = retry_read("list_members", || store.list_members(group_id)).await?;
        Ok(attach_distances(members))
    }

    pub async fn member(&self, member_id: Uuid) -> Result<MemberView, SessionError> {
        let member = self.live_member(member_id).await?;
        let store = &self.store;
        let peers = retry_read("list_members", || store.list_members(member.group_id)).await?;
        Ok(view_of(member, &peers))
    }

    pub async fn update_location(
        &self,
        member_id: Uuid,
        request: UpdateLocationRequest,
    ) -> Result<MemberView, SessionError> {
        let _guard = self.member_locks.acquire(member_id).await;
        let member = self.mutate_member(member_id, request.into()).await?;
        Ok(self.publish_member(member).await)
    }

    pub async fn update_status(
        &self,
        member_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<MemberView, SessionError> {
        let _guard = self.member_locks.acquire(member_id).await;
        let member = self.mutate_member(member_id, request.into()).await?;
        Ok(self.publish_member(member).await)
    }

    /// Removes a member, tells the group, then unbinds its connection.
    pub async fn leave(&self, member_id: Uuid) -> Result<(), SessionError> {
        let guard = self.member_locks.acquire(member_id).await;
        self.live_member(member_id).await?;

        let member = self
            .store
            .delete_member(member_id)
            .await?
            .ok_or_else(SessionError::member_not_found)?;

        let report = self
            .registry
            .broadcast(member.group_id, ServerEvent::MemberLeft { member_id });
        self.registry.evict(member_id);
        self.handle_failures(report);

        tracing::info!(group_id = %member.group_id, member_id = %member_id, "Member left");

        drop(guard);
        self.member_locks.forget(member_id);
        Ok(())
    }

    pub async fn send_message(
        &self,
        group_id: Uuid,
        request: SendMessageRequest,
    ) -> Result<Message, SessionError> {
        let _guard = self.group_locks.acquire(group_id).await;
        self.lifecycle.get_group(group_id).await?;
        self.require_member_of(group_id, request.member_id).await?;

        let message = self
            .store
            .create_message(request.into_new_message(group_id, Utc::now()))
            .await?;

        tracing::debug!(
            group_id = %group_id,
            member_id = %message.member_id,
            message_id = %message.id,
            "Message posted"
        );

        let report = self.registry.broadcast(
            group_id,
            ServerEvent::NewMessage {
                message: message.clone(),
            },
        );
        self.handle_failures(report);
        Ok(message)
    }

    pub async fn send_ping(
        &self,
        group_id: Uuid,
        request: SendPingRequest,
    ) -> Result<Ping, SessionError> {
        let _guard = self.group_locks.acquire(group_id).await;
        self.lifecycle.get_group(group_id).await?;
        self.require_member_of(group_id, request.from_member_id).await?;
        if let Some(to_member_id) = request.to_member_id {
            self.require_member_of(group_id, to_member_id).await?;
        }

        let ping = self
            .store
            .create_ping(request.into_new_ping(group_id, Utc::now()))
            .await?;

        tracing::debug!(
            group_id = %group_id,
            member_id = %ping.from_member_id,
            ping_id = %ping.id,
            "Ping sent"
        );

        // Receivers decide whether a ping is meant for them.
        let report = self
            .registry
            .broadcast(group_id, ServerEvent::NewPing { ping: ping.clone() });
        self.handle_failures(report);
        Ok(ping)
    }

    /// The most recent messages of a live group, oldest first.
    pub async fn recent_messages(
        &self,
        group_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, SessionError> {
        self.lifecycle.get_group(group_id).await?;
        let store = &self.store;
        Ok(retry_read("recent_messages", || store.recent_messages(group_id, limit)).await?)
    }

    /// The most recent pings of a live group, newest first.
    pub async fn recent_pings(&self, group_id: Uuid, limit: i64) -> Result<Vec<Ping>, SessionError> {
        self.lifecycle.get_group(group_id).await?;
        let store = &self.store;
        Ok(retry_read("recent_pings", || store.recent_pings(group_id, limit)).await?)
    }

    /// Binds a connection to a member. The member's status is left as is.
    ///
    /// Any connection previously bound to the member is dropped from the
    /// registry, which closes its outbound queue.
    pub async fn connect(
        &self,
        member_id: Uuid,
        handle: ConnectionHandle,
    ) -> Result<MemberView, SessionError> {
        let _guard = self.member_locks.acquire(member_id).await;
        let group_id = self.live_member(member_id).await?.group_id;

        // Binding under the group lock keeps a purge from slipping in
        // between the store update and the registry insert.
        let _group_guard = self.group_locks.acquire(group_id).await;
        self.live_member(member_id).await?;
        let connection_id = handle.id();

        let member = self
            .store
            .update_member(member_id, MemberChange::Connected { connection_id }, Utc::now())
            .await?
            .ok_or_else(SessionError::member_not_found)?;

        if let Some(previous) = self.registry.register(member_id, member.group_id, handle) {
            tracing::info!(
                member_id = %member_id,
                connection_id = %previous.id(),
                "Replacing stale connection"
            );
        }

        tracing::info!(
            group_id = %member.group_id,
            member_id = %member_id,
            connection_id = %connection_id,
            "Connection bound"
        );

        Ok(self.publish_member(member).await)
    }

    /// Handles a closed connection. Does nothing if the member has since
    /// been bound to another connection.
    pub async fn disconnect(&self, member_id: Uuid, connection_id: Uuid) {
        let _guard = self.member_locks.acquire(member_id).await;
        if !self.registry.unregister(member_id, connection_id) {
            tracing::debug!(
                member_id = %member_id,
                connection_id = %connection_id,
                "Closed connection was no longer bound"
            );
            return;
        }
        self.mark_offline(member_id, connection_id).await;
    }

    /// Deletes expired groups and drops lock entries nobody holds.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionError> {
        let swept = self.lifecycle.sweep_expired(now).await?;
        let pruned = self.member_locks.prune() + self.group_locks.prune();
        tracing::debug!(swept, pruned, "Sweep finished");
        Ok(swept)
    }

    async fn live_member(&self, member_id: Uuid) -> Result<Member, SessionError> {
        let store = &self.store;
        let member = retry_read("find_member", || store.find_member(member_id))
            .await?
            .ok_or_else(SessionError::member_not_found)?;
        self.lifecycle.get_group(member.group_id).await?;
        Ok(member)
    }

    async fn require_member_of(&self, group_id: Uuid, member_id: Uuid) -> Result<(), SessionError> {
        let store = &self.store;
        match retry_read("find_member", || store.find_member(member_id)).await? {
            Some(member) if member.group_id == group_id => Ok(()),
            _ => Err(SessionError::member_not_found()),
        }
    }

    /// Applies a change to a member of a live group. Caller holds the
    /// member lock.
    async fn mutate_member(
        &self,
        member_id: Uuid,
        change: MemberChange,
    ) -> Result<Member, SessionError> {
        self.live_member(member_id).await?;
        let kind = change.kind();
        let member = self
            .store
            .update_member(member_id, change, Utc::now())
            .await?
            .ok_or_else(SessionError::member_not_found)?;

        tracing::debug!(
            group_id = %member.group_id,
            member_id = %member_id,
            change = kind,
            "Member updated"
        );
        Ok(member)
    }

    /// Broadcasts the member's full state to its group and returns what
    /// was sent.
    async fn publish_member(&self, member: Member) -> MemberView {
        let view = if member.position().is_none() {
            MemberView::from(member)
        } else {
            let store = &self.store;
            let group_id = member.group_id;
            match retry_read("list_members", || store.list_members(group_id)).await {
                Ok(peers) => view_of(member, &peers),
                Err(err) => {
                    tracing::warn!(
                        member_id = %member.id,
                        error = %err,
                        "Could not load peers for distances"
                    );
                    MemberView::from(member)
                }
            }
        };

        let report = self.registry.broadcast(
            view.member.group_id,
            ServerEvent::MemberUpdated {
                member: view.clone(),
            },
        );
        self.handle_failures(report);
        view
    }

    /// Connections that failed a delivery have already been unbound; run
    /// the connection-loss transition for each of them in the background.
    fn handle_failures(&self, report: BroadcastReport) {
        for failed in report.failed {
            let sessions = self.clone();
            tokio::spawn(async move {
                sessions
                    .connection_lost(failed.member_id, failed.connection_id)
                    .await;
            });
        }
    }

    async fn connection_lost(&self, member_id: Uuid, connection_id: Uuid) {
        let _guard = self.member_locks.acquire(member_id).await;
        if self.registry.is_connected(member_id) {
            return;
        }
        self.mark_offline(member_id, connection_id).await;
    }

    /// Connection-loss transition. Caller holds the member lock and has
    /// already removed the binding.
    async fn mark_offline(&self, member_id: Uuid, connection_id: Uuid) {
        match self
            .store
            .update_member(member_id, MemberChange::Disconnected, Utc::now())
            .await
        {
            Ok(Some(member)) => {
                tracing::info!(
                    group_id = %member.group_id,
                    member_id = %member_id,
                    connection_id = %connection_id,
                    "Member went offline"
                );
                self.publish_member(member).await;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    member_id = %member_id,
                    connection_id = %connection_id,
                    error = %err,
                    "Failed to mark member offline"
                );
            }
        }
    }
}
