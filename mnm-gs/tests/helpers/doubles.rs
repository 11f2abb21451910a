//! Store and ranker stand-ins for failure paths

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mnm_common::{Group, PreferenceSet, RankedRestaurant};
use mnm_gs::store::{ExpirationStream, GroupStore, MemoryGroupStore, StoreError, StoreResult};
use mnm_re::{EngineError, EngineResult, Ranker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outage {
    /// Backend refuses connections
    Unreachable,
    /// Backend answers with records that do not decode
    Corrupt,
}

/// In-memory store that can be switched into an outage
pub struct FlakyGroupStore {
    inner: MemoryGroupStore,
    outage: Mutex<Option<Outage>>,
}

impl FlakyGroupStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryGroupStore::new(),
            outage: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, outage: Outage) {
        *self.outage.lock().unwrap_or_else(PoisonError::into_inner) = Some(outage);
    }

    pub fn recover(&self) {
        *self.outage.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn check(&self) -> StoreResult<()> {
        match *self.outage.lock().unwrap_or_else(PoisonError::into_inner) {
            None => Ok(()),
            Some(Outage::Unreachable) => {
                Err(StoreError::Unavailable("connection refused".to_string()))
            }
            Some(Outage::Corrupt) => Err(StoreError::Decode(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}

#[async_trait]
impl GroupStore for FlakyGroupStore {
    async fn get(&self, group_id: &str) -> StoreResult<Group> {
        self.check()?;
        self.inner.get(group_id).await
    }

    async fn insert(&self, group: &Group, ttl: Duration) -> StoreResult<()> {
        self.check()?;
        self.inner.insert(group, ttl).await
    }

    async fn set_with_ttl(&self, group: &Group, ttl: Duration) -> StoreResult<()> {
        self.check()?;
        self.inner.set_with_ttl(group, ttl).await
    }

    async fn compare_and_set(
        &self,
        group: &Group,
        expected_revision: u64,
        ttl: Duration,
    ) -> StoreResult<bool> {
        self.check()?;
        self.inner.compare_and_set(group, expected_revision, ttl).await
    }

    async fn subscribe_expirations(&self) -> StoreResult<ExpirationStream> {
        self.inner.subscribe_expirations().await
    }
}

/// Ranker whose candidates name a brand the catalog does not hold
pub struct UnknownBrandRanker;

impl Ranker for UnknownBrandRanker {
    fn rank(&self, _preferences: &[PreferenceSet]) -> EngineResult<Vec<RankedRestaurant>> {
        Err(EngineError::UnknownBrand("Ghost Kitchen".to_string()))
    }
}

/// Ranker that panics mid-scoring
pub struct PanickingRanker;

impl Ranker for PanickingRanker {
    fn rank(&self, _preferences: &[PreferenceSet]) -> EngineResult<Vec<RankedRestaurant>> {
        panic!("score table index out of range");
    }
}
