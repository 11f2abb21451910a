//! In-process group store
//!
//! Single-instance deployments and tests. Expired entries are invisible to
//! reads immediately; the sweeper removes them and reports each one on the
//! expiration stream, so listeners see the same contract as with a shared
//! store that pushes expiry events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use mnm_common::Group;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use super::{ExpirationStream, GroupStore, StoreError, StoreResult};

struct Entry {
    group: Group,
    deadline: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

pub struct MemoryGroupStore {
    entries: Mutex<HashMap<String, Entry>>,
    expired_tx: broadcast::Sender<String>,
}

impl Default for MemoryGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        let (expired_tx, _) = broadcast::channel(256);
        Self {
            entries: Mutex::new(HashMap::new()),
            expired_tx,
        }
    }

    /// Remove expired entries and announce them; returns how many expired
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = {
            let mut entries = self.entries.lock().await;
            let keys: Vec<String> = entries
                .iter()
                .filter(|(_, e)| !e.is_live(now))
                .map(|(k, _)| k.clone())
                .collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        for group_id in &expired {
            debug!(group_id = %group_id, "Group expired");
            // No subscribers is fine
            let _ = self.expired_tx.send(group_id.clone());
        }
        expired.len()
    }

    /// Run [`sweep_expired`](Self::sweep_expired) on a fixed interval
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        info!("Expiry sweeper running every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let swept = store.sweep_expired().await;
                if swept > 0 {
                    info!("Expired {} group(s)", swept);
                }
            }
        })
    }

    /// Report an entry that lapsed but was never swept before it is replaced
    fn announce_if_expired(&self, existing: Option<&Entry>, group_id: &str, now: Instant) {
        if existing.is_some_and(|e| !e.is_live(now)) {
            debug!(group_id = %group_id, "Group expired before sweep, replacing");
            let _ = self.expired_tx.send(group_id.to_string());
        }
    }

    /// Live group count
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn get(&self, group_id: &str) -> StoreResult<Group> {
        let entries = self.entries.lock().await;
        match entries.get(group_id) {
            Some(entry) if entry.is_live(Instant::now()) => Ok(entry.group.clone()),
            _ => Err(StoreError::NotFound(group_id.to_string())),
        }
    }

    async fn insert(&self, group: &Group, ttl: Duration) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(&group.id).is_some_and(|e| e.is_live(now)) {
            return Err(StoreError::AlreadyExists(group.id.clone()));
        }
        self.announce_if_expired(entries.get(&group.id), &group.id, now);
        entries.insert(
            group.id.clone(),
            Entry {
                group: group.clone(),
                deadline: now + ttl,
            },
        );
        Ok(())
    }

    async fn set_with_ttl(&self, group: &Group, ttl: Duration) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        self.announce_if_expired(entries.get(&group.id), &group.id, now);
        entries.insert(
            group.id.clone(),
            Entry {
                group: group.clone(),
                deadline: now + ttl,
            },
        );
        Ok(())
    }

    async fn compare_and_set(
        &self,
        group: &Group,
        expected_revision: u64,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(&group.id) {
            Some(entry) if entry.is_live(now) && entry.group.revision == expected_revision => {
                entry.group = group.clone();
                entry.deadline = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn subscribe_expirations(&self) -> StoreResult<ExpirationStream> {
        let stream = BroadcastStream::new(self.expired_tx.subscribe()).filter_map(|item| async move {
            match item {
                Ok(group_id) => Some(group_id),
                Err(e) => {
                    warn!("Expiration subscriber fell behind: {}", e);
                    None
                }
            }
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> Group {
        Group::new(id, chrono::Duration::seconds(600))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryGroupStore::new();
        store.insert(&group("g1"), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("g1").await.unwrap().id, "g1");
        assert!(matches!(store.get("g2").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_rejects_live_duplicate() {
        let store = MemoryGroupStore::new();
        store.insert(&group("g1"), Duration::from_secs(60)).await.unwrap();
        let err = store.insert(&group("g1"), Duration::from_secs(60)).await;
        assert!(matches!(err, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_compare_and_set_checks_revision() {
        let store = MemoryGroupStore::new();
        let mut g = group("g1");
        store.insert(&g, Duration::from_secs(60)).await.unwrap();

        g.revision = 1;
        assert!(store.compare_and_set(&g, 0, Duration::from_secs(60)).await.unwrap());
        // Stale writer still expects revision 0
        assert!(!store.compare_and_set(&g, 0, Duration::from_secs(60)).await.unwrap());
        assert_eq!(store.get("g1").await.unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_compare_and_set_on_missing_group() {
        let store = MemoryGroupStore::new();
        assert!(!store
            .compare_and_set(&group("ghost"), 0, Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_group_is_invisible_and_announced() {
        let store = MemoryGroupStore::new();
        let mut expirations = store.subscribe_expirations().await.unwrap();
        store.insert(&group("g1"), Duration::from_secs(10)).await.unwrap();
        store.insert(&group("g2"), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(matches!(store.get("g1").await, Err(StoreError::NotFound(_))));
        assert_eq!(store.len().await, 1);

        assert_eq!(store.sweep_expired().await, 1);
        assert_eq!(expirations.next().await.as_deref(), Some("g1"));
        assert_eq!(store.sweep_expired().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_unswept_expired_group_announces_it() {
        let store = MemoryGroupStore::new();
        let mut expirations = store.subscribe_expirations().await.unwrap();
        store.insert(&group("g1"), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        store.insert(&group("g1"), Duration::from_secs(60)).await.unwrap();
        assert_eq!(expirations.next().await.as_deref(), Some("g1"));

        // The replacement is live and the old entry is not swept again
        assert!(store.get("g1").await.is_ok());
        assert_eq!(store.sweep_expired().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_slide_the_deadline() {
        let store = MemoryGroupStore::new();
        let g = group("g1");
        store.insert(&g, Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        store.set_with_ttl(&g, Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(store.get("g1").await.is_ok());
    }
}
