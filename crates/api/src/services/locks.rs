//! Keyed async mutexes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per entity id, created on first use.
///
/// The guard is owned, so it can be held across store calls and the
/// broadcast that follows them.
#[derive(Debug, Clone, Default)]
pub struct EntityLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is released before awaiting.
        let lock = Arc::clone(self.locks.entry(id).or_default().value());
        lock.lock_owned().await
    }

    /// Drops the entry for an entity that no longer exists.
    pub fn forget(&self, id: Uuid) {
        self.locks.remove(&id);
    }

    /// Drops entries nobody holds or waits on. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
