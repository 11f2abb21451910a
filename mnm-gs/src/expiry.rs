//! Expired-session handling
//!
//! Listens on the store's expiration stream for the life of the process.
//! For each expired group: tell its channels the session expired, then
//! close them.

use std::sync::Arc;

use futures::StreamExt;
use mnm_common::GroupEvent;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::hub::BroadcastHub;
use crate::store::{ExpirationStream, GroupStore, StoreResult};

pub struct ExpiryListener {
    expirations: ExpirationStream,
}

impl ExpiryListener {
    /// Subscribe now so no expiry after this call is missed
    pub async fn subscribe(store: &dyn GroupStore) -> StoreResult<Self> {
        let expirations = store.subscribe_expirations().await?;
        Ok(Self { expirations })
    }

    pub fn spawn(self, hub: Arc<BroadcastHub>) -> JoinHandle<()> {
        tokio::spawn(self.run(hub))
    }

    pub async fn run(mut self, hub: Arc<BroadcastHub>) {
        info!("Expiry listener started");
        while let Some(group_id) = self.expirations.next().await {
            handle_expired(&hub, &group_id);
        }
        warn!("Expiration stream ended; expired sessions will no longer be announced");
    }
}

/// Announce expiry to a group's channels and close them
pub fn handle_expired(hub: &BroadcastHub, group_id: &str) {
    let notified = hub.broadcast(group_id, GroupEvent::session_expired());
    let closed = hub.close_all(group_id);
    info!(
        group_id = %group_id,
        notified,
        closed,
        "Session expired"
    );
}

/// Subscribe and spawn the listener; a failed subscription is logged, not fatal
pub async fn start(store: &dyn GroupStore, hub: Arc<BroadcastHub>) -> Option<JoinHandle<()>> {
    match ExpiryListener::subscribe(store).await {
        Ok(listener) => Some(listener.spawn(hub)),
        Err(e) => {
            error!("Could not subscribe to group expirations: {}", e);
            None
        }
    }
}
