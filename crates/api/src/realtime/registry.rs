//! Live connection registry and group fan-out.
//!
//! The registry maps a member id to the one connection currently bound to
//! it, together with the member's group captured at bind time. It never
//! holds member records. Fan-out copies the recipient handles out of the
//! map first and then enqueues without waiting, so no map lock is held
//! while a peer is slow.

use std::sync::Arc;

use dashmap::DashMap;
use domain::models::ServerEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::middleware::metrics::{
    record_delivery_failures, record_event_broadcast, set_realtime_connections,
};

/// Outbound half of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    tx: mpsc::Sender<Arc<ServerEvent>>,
}

impl ConnectionHandle {
    /// Creates a handle with a bounded queue of `capacity` events and the
    /// receiver the connection's writer drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Arc<ServerEvent>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueues without waiting. A full or closed queue is a failure.
    fn try_deliver(&self, event: Arc<ServerEvent>) -> bool {
        self.tx.try_send(event).is_ok()
    }
}

#[derive(Debug, Clone)]
struct Binding {
    group_id: Uuid,
    handle: ConnectionHandle,
}

/// A connection that could not take an event and was unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedDelivery {
    pub member_id: Uuid,
    pub connection_id: Uuid,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<FailedDelivery>,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    bindings: Arc<DashMap<Uuid, Binding>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handle` to the member. Last writer wins: a previous binding
    /// is returned so the caller can drop it, which closes that socket.
    pub fn register(
        &self,
        member_id: Uuid,
        group_id: Uuid,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let previous = self
            .bindings
            .insert(member_id, Binding { group_id, handle })
            .map(|b| b.handle);
        set_realtime_connections(self.bindings.len());
        previous
    }

    /// Removes the member's binding only if it still belongs to
    /// `connection_id`. Returns true if something was removed.
    pub fn unregister(&self, member_id: Uuid, connection_id: Uuid) -> bool {
        let removed = self
            .bindings
            .remove_if(&member_id, |_, binding| binding.handle.id == connection_id)
            .is_some();
        if removed {
            set_realtime_connections(self.bindings.len());
        }
        removed
    }

    /// Drops the member's binding whatever connection holds it.
    pub fn evict(&self, member_id: Uuid) -> bool {
        let removed = self.bindings.remove(&member_id).is_some();
        if removed {
            set_realtime_connections(self.bindings.len());
        }
        removed
    }

    /// Drops every binding of a group. Returns how many were removed.
    pub fn evict_group(&self, group_id: Uuid) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, binding| binding.group_id != group_id);
        let removed = before.saturating_sub(self.bindings.len());
        if removed > 0 {
            set_realtime_connections(self.bindings.len());
        }
        removed
    }

    pub fn is_connected(&self, member_id: Uuid) -> bool {
        self.bindings.contains_key(&member_id)
    }

    /// Id of the connection bound to the member, if any.
    pub fn connection_of(&self, member_id: Uuid) -> Option<Uuid> {
        self.bindings.get(&member_id).map(|b| b.handle.id)
    }

    pub fn connection_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn group_connection_count(&self, group_id: Uuid) -> usize {
        self.bindings
            .iter()
            .filter(|entry| entry.value().group_id == group_id)
            .count()
    }

    /// Delivers `event` to every connection bound to a member of
    /// `group_id`, sender included. Connections that cannot take it are
    /// unbound and reported; the rest are unaffected.
    pub fn broadcast(&self, group_id: Uuid, event: ServerEvent) -> BroadcastReport {
        let recipients: Vec<(Uuid, ConnectionHandle)> = self
            .bindings
            .iter()
            .filter(|entry| entry.value().group_id == group_id)
            .map(|entry| (*entry.key(), entry.value().handle.clone()))
            .collect();

        record_event_broadcast(event.name());
        let event = Arc::new(event);
        let mut report = BroadcastReport::default();

        for (member_id, handle) in recipients {
            if handle.try_deliver(Arc::clone(&event)) {
                report.delivered += 1;
            } else if self.unregister(member_id, handle.id) {
                tracing::warn!(
                    %member_id,
                    connection_id = %handle.id,
                    event = event.name(),
                    "Dropping connection that could not take an event"
                );
                report.failed.push(FailedDelivery {
                    member_id,
                    connection_id: handle.id,
                });
            }
        }

        if !report.failed.is_empty() {
            record_delivery_failures(report.failed.len());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left(member_id: Uuid) -> ServerEvent {
        ServerEvent::MemberLeft { member_id }
    }

    #[test]
    fn test_register_replaces_previous() {
        let registry = ConnectionRegistry::new();
        let member = Uuid::new_v4();
        let group = Uuid::new_v4();
        let (first, _rx1) = ConnectionHandle::channel(4);
        let (second, _rx2) = ConnectionHandle::channel(4);
        let (first_id, second_id) = (first.id(), second.id());

        assert!(registry.register(member, group, first).is_none());
        let replaced = registry.register(member, group, second).unwrap();
        assert_eq!(replaced.id(), first_id);
        assert_eq!(registry.connection_of(member), Some(second_id));
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_unregister_requires_matching_connection() {
        let registry = ConnectionRegistry::new();
        let member = Uuid::new_v4();
        let (handle, _rx) = ConnectionHandle::channel(4);
        let id = handle.id();
        registry.register(member, Uuid::new_v4(), handle);

        assert!(!registry.unregister(member, Uuid::new_v4()));
        assert!(registry.is_connected(member));
        assert!(registry.unregister(member, id));
        assert!(!registry.is_connected(member));
        assert!(!registry.unregister(member, id));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_the_group() {
        let registry = ConnectionRegistry::new();
        let group = Uuid::new_v4();
        let other_group = Uuid::new_v4();

        let (a, mut rx_a) = ConnectionHandle::channel(4);
        let (b, mut rx_b) = ConnectionHandle::channel(4);
        let (c, mut rx_c) = ConnectionHandle::channel(4);
        registry.register(Uuid::new_v4(), group, a);
        registry.register(Uuid::new_v4(), group, b);
        registry.register(Uuid::new_v4(), other_group, c);

        let gone = Uuid::new_v4();
        let report = registry.broadcast(group, left(gone));
        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());

        assert_eq!(*rx_a.recv().await.unwrap(), left(gone));
        assert_eq!(*rx_b.recv().await.unwrap(), left(gone));
        assert!(rx_c.try_recv().is_err());
    }

    #[test]
    fn test_closed_connection_is_unbound() {
        let registry = ConnectionRegistry::new();
        let group = Uuid::new_v4();
        let dead_member = Uuid::new_v4();
        let live_member = Uuid::new_v4();

        let (dead, dead_rx) = ConnectionHandle::channel(4);
        let dead_id = dead.id();
        let (live, _live_rx) = ConnectionHandle::channel(4);
        registry.register(dead_member, group, dead);
        registry.register(live_member, group, live);
        drop(dead_rx);

        let report = registry.broadcast(group, left(Uuid::new_v4()));
        assert_eq!(report.delivered, 1);
        assert_eq!(
            report.failed,
            vec![FailedDelivery {
                member_id: dead_member,
                connection_id: dead_id,
            }]
        );
        assert!(!registry.is_connected(dead_member));
        assert!(registry.is_connected(live_member));
    }

    #[test]
    fn test_full_queue_counts_as_failure() {
        let registry = ConnectionRegistry::new();
        let group = Uuid::new_v4();
        let member = Uuid::new_v4();
        let (slow, _rx) = ConnectionHandle::channel(1);
        registry.register(member, group, slow);

        assert_eq!(registry.broadcast(group, left(Uuid::new_v4())).delivered, 1);
        let report = registry.broadcast(group, left(Uuid::new_v4()));
        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed.len(), 1);
        assert!(!registry.is_connected(member));
    }

    #[test]
    fn test_evict_group() {
        let registry = ConnectionRegistry::new();
        let group = Uuid::new_v4();
        let keep = Uuid::new_v4();
        for _ in 0..3 {
            let (h, _rx) = ConnectionHandle::channel(1);
            registry.register(Uuid::new_v4(), group, h);
        }
        let (h, _rx) = ConnectionHandle::channel(1);
        registry.register(Uuid::new_v4(), keep, h);

        assert_eq!(registry.group_connection_count(group), 3);
        assert_eq!(registry.evict_group(group), 3);
        assert_eq!(registry.group_connection_count(group), 0);
        assert_eq!(registry.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_evict_closes_the_queue() {
        let registry = ConnectionRegistry::new();
        let member = Uuid::new_v4();
        let (handle, mut rx) = ConnectionHandle::channel(1);
        registry.register(member, Uuid::new_v4(), handle);

        assert!(registry.evict(member));
        assert!(rx.recv().await.is_none());
    }
}
