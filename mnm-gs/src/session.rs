//! Group session state machine
//!
//! A group moves OPEN → COMPUTED → (CLOSED | EXPIRED):
//! - OPEN: participants join and submit preferences
//! - COMPUTED: a ranked result is stored; the group is immutable
//! - CLOSED: closed on request; every operation answers NotFound until the
//!   record lapses after a short grace period
//!
//! Every read-modify-write goes through [`SessionStateMachine::update_group`],
//! which retries on a revision mismatch so concurrent writers (in this
//! process or another sharing the store) never lose an update. Each
//! successful join, submission, compute and close sends exactly one
//! notification to the group's channels.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mnm_common::config::TomlConfig;
use mnm_common::{
    Group, GroupEvent, GroupState, GroupStatus, Participant, PreferenceSet, RestaurantView,
};
use mnm_re::Ranker;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::hub::BroadcastHub;
use crate::store::{GroupStore, StoreError};

const GROUP_ID_LEN: usize = 8;
const USER_ID_LEN: usize = 6;
const MAX_WRITE_ATTEMPTS: u32 = 32;

/// Session operation error
#[derive(Debug, Error)]
pub enum SessionError {
    /// Group or participant absent (or the group is closed)
    #[error("{0}")]
    NotFound(String),

    /// Operation clashes with the group's current state
    #[error("{0}")]
    Conflict(String),

    /// Group is not in a state the operation can run from
    #[error("{0}")]
    InvalidState(String),

    #[error("Group store unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Scoring failed unexpectedly
    #[error("Compute failed: {0}")]
    ComputeFailure(String),
}

impl SessionError {
    /// Stable external error code
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "NOT_FOUND",
            SessionError::Conflict(_) => "CONFLICT",
            SessionError::InvalidState(_) => "INVALID_STATE",
            SessionError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            SessionError::ComputeFailure(_) => "COMPUTE_FAILURE",
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SessionError::NotFound(format!("Group not found: {}", id)),
            StoreError::AlreadyExists(id) => {
                SessionError::Conflict(format!("Group already exists: {}", id))
            }
            StoreError::Unavailable(msg) => SessionError::UpstreamUnavailable(msg),
            StoreError::Decode(msg) => {
                SessionError::UpstreamUnavailable(format!("unreadable group record: {}", msg))
            }
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Session timing
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sliding lifetime of an idle group
    pub session_ttl: Duration,
    /// How long a closed group lingers before it expires
    pub close_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&TomlConfig::default())
    }
}

impl From<&TomlConfig> for SessionConfig {
    fn from(config: &TomlConfig) -> Self {
        Self {
            session_ttl: Duration::from_secs(config.session_ttl_secs),
            close_grace: Duration::from_secs(config.close_grace_secs),
        }
    }
}

fn short_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

fn group_not_found(group_id: &str) -> SessionError {
    SessionError::NotFound(format!("Group not found: {}", group_id))
}

pub struct SessionStateMachine {
    store: Arc<dyn GroupStore>,
    hub: Arc<BroadcastHub>,
    ranker: Arc<dyn Ranker>,
    config: SessionConfig,
}

impl SessionStateMachine {
    pub fn new(
        store: Arc<dyn GroupStore>,
        hub: Arc<BroadcastHub>,
        ranker: Arc<dyn Ranker>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            hub,
            ranker,
            config,
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn store(&self) -> &Arc<dyn GroupStore> {
        &self.store
    }

    /// Load a group that has not been closed
    async fn load_open(&self, group_id: &str) -> SessionResult<Group> {
        let group = self.store.get(group_id).await?;
        if group.state() == GroupState::Closed {
            return Err(group_not_found(group_id));
        }
        Ok(group)
    }

    /// Atomic read-modify-write with the session TTL
    async fn update_group<T, F>(&self, group_id: &str, mutate: F) -> SessionResult<(Group, T)>
    where
        F: FnMut(&mut Group) -> SessionResult<T>,
    {
        self.update_group_with_ttl(group_id, self.config.session_ttl, mutate)
            .await
    }

    /// Apply `mutate` to the current record and commit it with compare-and-set
    ///
    /// A rejected mutation commits nothing. A lost race re-reads and retries.
    async fn update_group_with_ttl<T, F>(
        &self,
        group_id: &str,
        ttl: Duration,
        mut mutate: F,
    ) -> SessionResult<(Group, T)>
    where
        F: FnMut(&mut Group) -> SessionResult<T>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut group = self.load_open(group_id).await?;
            let expected = group.revision;

            let value = mutate(&mut group)?;
            group.revision = expected + 1;
            group.expires_at = Utc::now()
                + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());

            if self.store.compare_and_set(&group, expected, ttl).await? {
                return Ok((group, value));
            }
            debug!(group_id = %group_id, attempt, "Concurrent update, retrying");
            tokio::task::yield_now().await;
        }

        warn!(group_id = %group_id, "Gave up after {} write attempts", MAX_WRITE_ATTEMPTS);
        Err(SessionError::Conflict(
            "Group is being updated concurrently, retry".to_string(),
        ))
    }

    /// Create an empty OPEN group
    pub async fn create_group(&self) -> SessionResult<String> {
        let ttl = chrono::Duration::from_std(self.config.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::zero());

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let group = Group::new(short_id(GROUP_ID_LEN), ttl);
            match self.store.insert(&group, self.config.session_ttl).await {
                Ok(()) => {
                    info!(group_id = %group.id, "Group created");
                    return Ok(group.id);
                }
                Err(StoreError::AlreadyExists(id)) => {
                    debug!(group_id = %id, "Group id collision, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SessionError::UpstreamUnavailable(
            "could not allocate a group id".to_string(),
        ))
    }

    /// Add a participant to an OPEN group; returns the new participant id
    pub async fn add_user(&self, group_id: &str) -> SessionResult<String> {
        let (group, user_id) = self
            .update_group(group_id, |group| {
                if group.state() == GroupState::Computed {
                    return Err(SessionError::Conflict(
                        "Group already has a result; no new participants".to_string(),
                    ));
                }
                let mut user_id = short_id(USER_ID_LEN);
                while group.participants.contains_key(&user_id) {
                    user_id = short_id(USER_ID_LEN);
                }
                group
                    .participants
                    .insert(user_id.clone(), Participant::new(user_id.clone()));
                Ok(user_id)
            })
            .await
            .inspect_err(|e| debug!(group_id = %group_id, "Join rejected: {}", e))?;

        let status = group.status();
        info!(
            group_id = %group_id,
            user_id = %user_id,
            total = status.total,
            "Participant joined"
        );
        self.hub.broadcast(group_id, GroupEvent::user_joined(status));
        Ok(user_id)
    }

    /// Record a participant's preferences and mark them ready
    pub async fn submit_preferences(
        &self,
        group_id: &str,
        user_id: &str,
        preferences: PreferenceSet,
    ) -> SessionResult<()> {
        let preferences = preferences.normalized();

        let (group, ()) = self
            .update_group(group_id, |group| {
                let participant = group.participants.get_mut(user_id).ok_or_else(|| {
                    SessionError::NotFound(format!("User not found: {}", user_id))
                })?;
                if !participant.submit(preferences.clone()) {
                    return Err(SessionError::Conflict(
                        "Preferences already submitted".to_string(),
                    ));
                }
                Ok(())
            })
            .await
            .inspect_err(|e| {
                debug!(group_id = %group_id, user_id = %user_id, "Submission rejected: {}", e)
            })?;

        let status = group.status();
        info!(
            group_id = %group_id,
            user_id = %user_id,
            ready = status.ready,
            total = status.total,
            "Preferences submitted"
        );
        self.hub
            .broadcast(group_id, GroupEvent::user_ready(user_id, status));
        Ok(())
    }

    pub async fn group_status(&self, group_id: &str) -> SessionResult<GroupStatus> {
        Ok(self.load_open(group_id).await?.status())
    }

    /// Rank restaurants for a fully ready group and store the result
    ///
    /// Scoring runs on the blocking pool. The result is committed atomically;
    /// if anything fails the group stays OPEN with no result.
    pub async fn compute(&self, group_id: &str) -> SessionResult<()> {
        let snapshot = self.load_open(group_id).await?;
        let preferences = check_computable(&snapshot)
            .inspect_err(|e| debug!(group_id = %group_id, "Compute rejected: {}", e))?;

        let ranker = Arc::clone(&self.ranker);
        let ranked = tokio::task::spawn_blocking(move || ranker.rank(&preferences))
            .await
            .map_err(|e| {
                error!(group_id = %group_id, "Scoring task failed: {}", e);
                SessionError::ComputeFailure(format!("scoring task failed: {}", e))
            })?
            .map_err(|e| {
                error!(group_id = %group_id, "Scoring failed: {}", e);
                SessionError::ComputeFailure(e.to_string())
            })?;

        let count = ranked.len();
        let participants = snapshot.participants.len();
        self.update_group(group_id, |group| {
            // The group may have changed while scoring ran
            check_computable(group)?;
            if group.participants.len() != participants {
                return Err(SessionError::InvalidState(
                    "Participants changed during compute".to_string(),
                ));
            }
            group.result = Some(ranked.clone());
            Ok(())
        })
        .await
        .inspect_err(|e| debug!(group_id = %group_id, "Compute commit rejected: {}", e))?;

        info!(group_id = %group_id, results = count, "Result computed");
        self.hub.broadcast(group_id, GroupEvent::ResultComputed);
        Ok(())
    }

    /// Stored ranking, display-projected
    pub async fn get_result(&self, group_id: &str) -> SessionResult<Vec<RestaurantView>> {
        let group = self.load_open(group_id).await?;
        let result = group
            .result
            .ok_or_else(|| SessionError::NotFound("Result not computed yet".to_string()))?;
        Ok(result.iter().map(RestaurantView::from).collect())
    }

    /// Close a group on request
    ///
    /// The record is marked closed and lingers for the grace period, then
    /// expires through the normal expiry path, which closes the channels.
    pub async fn close_group(&self, group_id: &str) -> SessionResult<()> {
        self.update_group_with_ttl(group_id, self.config.close_grace, |group| {
            group.closed_at = Some(Utc::now());
            Ok(())
        })
        .await?;

        info!(group_id = %group_id, "Group closing");
        self.hub.broadcast(group_id, GroupEvent::session_closing());
        Ok(())
    }
}

/// Preferences to score, or why the group cannot be computed
fn check_computable(group: &Group) -> SessionResult<Vec<PreferenceSet>> {
    if group.state() == GroupState::Computed {
        return Err(SessionError::Conflict("Result already computed".to_string()));
    }
    if group.participants.is_empty() {
        return Err(SessionError::InvalidState("Group has no participants".to_string()));
    }
    if !group.all_ready() {
        return Err(SessionError::InvalidState("Not all participants are ready".to_string()));
    }
    let preferences = group.ready_preferences();
    if preferences.is_empty() {
        return Err(SessionError::InvalidState("No usable preferences".to_string()));
    }
    Ok(preferences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use mnm_common::LocationInput;

    fn prefs() -> PreferenceSet {
        PreferenceSet {
            cuisines: vec!["Chinese".to_string()],
            restaurant_types: Vec::new(),
            dish_preferences: Vec::new(),
            budget: 500,
            location: LocationInput::Named("Koramangala".to_string()),
        }
    }

    #[test]
    fn test_short_ids() {
        assert_eq!(short_id(GROUP_ID_LEN).len(), 8);
        assert_eq!(short_id(USER_ID_LEN).len(), 6);
    }

    #[test]
    fn test_check_computable() {
        let mut group = Group::new("g1", ChronoDuration::seconds(600));
        assert!(matches!(check_computable(&group), Err(SessionError::InvalidState(_))));

        group.participants.insert("a".into(), Participant::new("a"));
        assert!(matches!(check_computable(&group), Err(SessionError::InvalidState(_))));

        group.participants.get_mut("a").unwrap().submit(prefs());
        assert_eq!(check_computable(&group).unwrap().len(), 1);

        group.result = Some(Vec::new());
        assert!(matches!(check_computable(&group), Err(SessionError::Conflict(_))));
    }

    #[test]
    fn test_store_error_mapping() {
        let e: SessionError = StoreError::Unavailable("connection refused".into()).into();
        assert_eq!(e.code(), "UPSTREAM_UNAVAILABLE");
        let e: SessionError = StoreError::NotFound("g1".into()).into();
        assert_eq!(e.code(), "NOT_FOUND");
    }
}
