//! Group creation, lookup and expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domain::models::group::NewGroup;
use domain::models::Group;
use persistence::{PurgeSummary, RecordStore, StoreError};
use shared::codes::{all_join_codes, generate_join_code, normalize_join_code};
use uuid::Uuid;

use super::{retry_read, EntityLocks, SessionError};
use crate::config::GroupsConfig;
use crate::middleware::metrics::{record_group_created, record_groups_swept};
use crate::realtime::ConnectionRegistry;

/// Issues groups with unique join codes and tears down expired ones.
#[derive(Clone)]
pub struct GroupLifecycle {
    store: Arc<dyn RecordStore>,
    registry: ConnectionRegistry,
    group_locks: EntityLocks,
    code_prefix: String,
    ttl: Duration,
    max_code_attempts: u32,
}

impl GroupLifecycle {
    pub fn new(
        store: Arc<dyn RecordStore>,
        registry: ConnectionRegistry,
        group_locks: EntityLocks,
        config: &GroupsConfig,
    ) -> Self {
        Self {
            store,
            registry,
            group_locks,
            code_prefix: config.code_prefix.clone(),
            ttl: Duration::hours(config.ttl_hours),
            max_code_attempts: config.max_code_attempts,
        }
    }

    /// Creates a group with a fresh join code.
    ///
    /// A code held by a live group is never reused. A code held by an
    /// expired group that has not been swept yet is freed by purging that
    /// group first. The store's uniqueness check catches concurrent
    /// creators picking the same code; those attempts are retried too.
    ///
    /// Random codes are tried first. If none of them is free, every code of
    /// the prefix is tried in turn, so creation only fails when each one
    /// belongs to a live group.
    pub async fn create_group(&self, name: &str) -> Result<Group, SessionError> {
        let now = Utc::now();
        let name = name.trim();
        let mut attempts = 0;

        let random = (0..self.max_code_attempts).map(|_| generate_join_code(&self.code_prefix));
        for code in random.chain(all_join_codes(&self.code_prefix)) {
            attempts += 1;
            if let Some(group) = self.try_code(name, code, now, attempts).await? {
                return Ok(group);
            }
            if attempts == self.max_code_attempts {
                tracing::warn!(
                    attempts,
                    prefix = %self.code_prefix,
                    "Random join codes exhausted, scanning the code space"
                );
            }
        }

        Err(SessionError::Exhausted(attempts))
    }

    /// Tries to create the group under `code`. `None` means the code is
    /// held by a live group or was taken concurrently.
    async fn try_code(
        &self,
        name: &str,
        code: String,
        now: DateTime<Utc>,
        attempt: u32,
    ) -> Result<Option<Group>, SessionError> {
        match self.store.find_group_by_code(&code).await? {
            Some(existing) if !existing.is_expired_at(now) => {
                tracing::trace!(attempt, code = %code, "Join code taken");
                return Ok(None);
            }
            Some(expired) => {
                self.purge(&expired).await?;
            }
            None => {}
        }

        match self.store.create_group(NewGroup::new(name, code, now, self.ttl)).await {
            Ok(group) => {
                record_group_created();
                tracing::info!(
                    group_id = %group.id,
                    code = %group.code,
                    expires_at = %group.expires_at,
                    attempt,
                    "Group created"
                );
                Ok(Some(group))
            }
            Err(StoreError::DuplicateCode(code)) => {
                tracing::debug!(attempt, code = %code, "Join code raced, retrying");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Looks up a live group. Expired groups are reported as not found.
    pub async fn get_group(&self, id: Uuid) -> Result<Group, SessionError> {
        let store = &self.store;
        let group = retry_read("find_group", || store.find_group(id)).await?;
        live(group, Utc::now())
    }

    /// Looks up a live group by join code. Case and surrounding whitespace
    /// are ignored.
    pub async fn get_group_by_code(&self, code: &str) -> Result<Group, SessionError> {
        let code = normalize_join_code(code);
        let store = &self.store;
        let group = retry_read("find_group_by_code", || store.find_group_by_code(&code)).await?;
        live(group, Utc::now())
    }

    /// Deletes every group that expired before `now`, together with its
    /// members, messages and pings, and unbinds their connections.
    /// Returns how many groups were removed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionError> {
        let store = &self.store;
        let expired = retry_read("list_expired_groups", || store.list_expired_groups(now)).await?;

        let mut swept = 0;
        for group in &expired {
            match self.purge(group).await {
                Ok(summary) if summary.group_deleted => swept += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(group_id = %group.id, error = %err, "Failed to purge expired group");
                }
            }
        }

        if swept > 0 {
            record_groups_swept(swept);
        }
        Ok(swept)
    }

    /// Purges one group under its lock, so no member, message or ping can
    /// be written into it mid-delete.
    async fn purge(&self, group: &Group) -> Result<PurgeSummary, StoreError> {
        let _guard = self.group_locks.acquire(group.id).await;

        let summary = self.store.delete_group_cascade(group.id).await?;
        let evicted = self.registry.evict_group(group.id);

        tracing::info!(
            group_id = %group.id,
            code = %group.code,
            members = summary.members,
            messages = summary.messages,
            pings = summary.pings,
            connections = evicted,
            "Expired group purged"
        );
        Ok(summary)
    }
}

fn live(group: Option<Group>, now: DateTime<Utc>) -> Result<Group, SessionError> {
    match group {
        Some(group) if !group.is_expired_at(now) => Ok(group),
        _ => Err(SessionError::group_not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::member::{CreateMemberRequest, NewMember};
    use persistence::MemoryStore;
    use shared::codes::{is_join_code, CODE_NUMBER_MAX, CODE_NUMBER_MIN, CODE_SPACE};

    fn config(prefix: &str, max_code_attempts: u32) -> GroupsConfig {
        GroupsConfig {
            code_prefix: prefix.to_string(),
            ttl_hours: 24,
            sweep_interval_minutes: 60,
            max_code_attempts,
        }
    }

    fn lifecycle(store: Arc<MemoryStore>, prefix: &str, attempts: u32) -> GroupLifecycle {
        GroupLifecycle::new(
            store,
            ConnectionRegistry::new(),
            EntityLocks::new(),
            &config(prefix, attempts),
        )
    }

    /// Stores a group with the given code, created `age` ago with a one
    /// hour lifetime.
    async fn seed_group(store: &MemoryStore, code: String, age: Duration) -> Group {
        store
            .create_group(NewGroup::new(
                "Seed",
                code,
                Utc::now() - age,
                Duration::hours(1),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_group_sets_code_and_expiry() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = lifecycle(store, "GRT", 100);

        let group = lifecycle.create_group("  Trek ").await.unwrap();
        assert_eq!(group.name, "Trek");
        assert!(group.code.starts_with("GRT-"));
        assert!(is_join_code(&group.code));

        let ttl = group.expires_at - group.created_at;
        assert_eq!(ttl, Duration::hours(24));
        assert!(group.expires_at > Utc::now() + Duration::hours(23));
    }

    #[tokio::test]
    async fn test_create_group_skips_live_codes() {
        let store = Arc::new(MemoryStore::new());
        // Every even code is taken by a live group.
        for n in (CODE_NUMBER_MIN..=CODE_NUMBER_MAX).step_by(2) {
            seed_group(&store, format!("EV-{}", n), Duration::zero()).await;
        }
        let lifecycle = lifecycle(store.clone(), "EV", 200);

        let group = lifecycle.create_group("Trek").await.unwrap();
        let number: u16 = group.code["EV-".len()..].parse().unwrap();
        assert_eq!((number - CODE_NUMBER_MIN) % 2, 1);
    }

    #[tokio::test]
    async fn test_create_group_exhausted() {
        let store = Arc::new(MemoryStore::new());
        for n in CODE_NUMBER_MIN..=CODE_NUMBER_MAX {
            seed_group(&store, format!("FULL-{}", n), Duration::zero()).await;
        }
        let lifecycle = lifecycle(store, "FULL", 5);

        let result = lifecycle.create_group("Trek").await;
        let expected = 5 + CODE_SPACE as u32;
        assert!(matches!(result, Err(SessionError::Exhausted(n)) if n == expected));
    }

    #[tokio::test]
    async fn test_create_group_finds_last_free_code() {
        let store = Arc::new(MemoryStore::new());
        for n in CODE_NUMBER_MIN..CODE_NUMBER_MAX {
            seed_group(&store, format!("GRT-{}", n), Duration::zero()).await;
        }
        let lifecycle = lifecycle(store.clone(), "GRT", 100);

        let group = lifecycle.create_group("Trek").await.unwrap();
        assert_eq!(group.code, format!("GRT-{}", CODE_NUMBER_MAX));

        // Now every code is live.
        assert!(matches!(
            lifecycle.create_group("Late").await,
            Err(SessionError::Exhausted(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_codes() {
        let store = Arc::new(MemoryStore::new());
        // Leave only 40 free codes so concurrent creators keep colliding.
        for n in CODE_NUMBER_MIN..=CODE_NUMBER_MAX - 40 {
            seed_group(&store, format!("RC-{}", n), Duration::zero()).await;
        }
        let lifecycle = lifecycle(store.clone(), "RC", 3);

        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let lifecycle = lifecycle.clone();
                tokio::spawn(async move { lifecycle.create_group(&format!("Trek {}", i)).await })
            })
            .collect();

        let mut codes = std::collections::HashSet::new();
        for task in futures_util::future::join_all(tasks).await {
            let group = task.unwrap().unwrap();
            assert!(codes.insert(group.code));
        }
        assert_eq!(codes.len(), 40);
        assert!(matches!(
            lifecycle.create_group("One too many").await,
            Err(SessionError::Exhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_create_group_reclaims_expired_codes() {
        let store = Arc::new(MemoryStore::new());
        for n in CODE_NUMBER_MIN..=CODE_NUMBER_MAX {
            seed_group(&store, format!("OLD-{}", n), Duration::hours(2)).await;
        }
        let lifecycle = lifecycle(store.clone(), "OLD", 1);

        let group = lifecycle.create_group("Fresh").await.unwrap();
        let holder = store.find_group_by_code(&group.code).await.unwrap().unwrap();
        assert_eq!(holder.id, group.id);
        assert!(!holder.is_expired());
    }

    #[tokio::test]
    async fn test_get_group_hides_expired() {
        let store = Arc::new(MemoryStore::new());
        let expired = seed_group(&store, "GRT-1234".into(), Duration::hours(2)).await;
        let lifecycle = lifecycle(store, "GRT", 100);

        assert!(matches!(
            lifecycle.get_group(expired.id).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            lifecycle.get_group_by_code("GRT-1234").await,
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(
            lifecycle.get_group(Uuid::new_v4()).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_group_by_code_normalizes() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = lifecycle(store, "GRT", 100);
        let group = lifecycle.create_group("Trek").await.unwrap();

        let typed = format!("  {} ", group.code.to_lowercase());
        let found = lifecycle.get_group_by_code(&typed).await.unwrap();
        assert_eq!(found.id, group.id);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_groups() {
        let store = Arc::new(MemoryStore::new());
        let old = seed_group(&store, "GRT-1111".into(), Duration::hours(2)).await;
        let fresh = seed_group(&store, "GRT-2222".into(), Duration::zero()).await;
        let member = store
            .create_member(NewMember::new(
                old.id,
                CreateMemberRequest {
                    name: "Alice".into(),
                    status: None,
                },
                Utc::now(),
            ))
            .await
            .unwrap();

        let lifecycle = lifecycle(store.clone(), "GRT", 100);
        assert_eq!(lifecycle.sweep_expired(Utc::now()).await.unwrap(), 1);

        assert!(store.find_group(old.id).await.unwrap().is_none());
        assert!(store.find_member(member.id).await.unwrap().is_none());
        assert!(store.find_group(fresh.id).await.unwrap().is_some());

        assert_eq!(lifecycle.sweep_expired(Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_surfaces_store_outage() {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = lifecycle(store.clone(), "GRT", 100);
        store.set_unavailable(true);

        assert!(matches!(
            lifecycle.sweep_expired(Utc::now()).await,
            Err(SessionError::Store(StoreError::Unavailable(_)))
        ));
    }
}
