//! Group record storage
//!
//! Every group lives under its own key with a time-to-live. Writes are
//! whole-record replacements; read-modify-write callers use
//! [`GroupStore::compare_and_set`] against the record's `revision` so two
//! writers never silently overwrite each other.
//!
//! Expired keys are reported on the expiration stream exactly once.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use mnm_common::Group;
use thiserror::Error;

pub use memory::MemoryGroupStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisGroupStore;

/// Group store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Group not found: {0}")]
    NotFound(String),

    #[error("Group already exists: {0}")]
    AlreadyExists(String),

    /// Backing store unreachable or failed the command
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored value is not a valid group record
    #[error("Invalid group record: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Stream of expired group ids
pub type ExpirationStream = BoxStream<'static, String>;

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Fetch a live group
    async fn get(&self, group_id: &str) -> StoreResult<Group>;

    /// Store a new group; fails with `AlreadyExists` if the id is taken
    async fn insert(&self, group: &Group, ttl: Duration) -> StoreResult<()>;

    /// Unconditionally store a group and reset its time-to-live
    async fn set_with_ttl(&self, group: &Group, ttl: Duration) -> StoreResult<()>;

    /// Store `group` only if the live record still has `expected_revision`
    ///
    /// Returns false when the record changed or disappeared.
    async fn compare_and_set(
        &self,
        group: &Group,
        expected_revision: u64,
        ttl: Duration,
    ) -> StoreResult<bool>;

    /// Subscribe to expired group ids
    async fn subscribe_expirations(&self) -> StoreResult<ExpirationStream>;
}

/// Decode and check a stored record
pub(crate) fn decode_group(raw: &str) -> StoreResult<Group> {
    let group: Group =
        serde_json::from_str(raw).map_err(|e| StoreError::Decode(e.to_string()))?;
    group.validate().map_err(StoreError::Decode)?;
    Ok(group)
}

pub(crate) fn encode_group(group: &Group) -> StoreResult<String> {
    serde_json::to_string(group).map_err(|e| StoreError::Decode(e.to_string()))
}
