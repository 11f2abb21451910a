//! Per-group notification fan-out
//!
//! Each connected client owns one bounded channel. Broadcasting never waits:
//! a full or closed channel loses that message and the others still get it.
//! One slot per channel is held back for terminal events, so a slow client
//! that fell behind still learns why its stream ends. Closed channels are
//! pruned when the next client connects to the group.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use mnm_common::GroupEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub type ChannelId = u64;

type Channels = HashMap<ChannelId, mpsc::Sender<GroupEvent>>;

pub struct BroadcastHub {
    groups: RwLock<HashMap<String, Channels>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl BroadcastHub {
    /// `buffer` is the per-channel queue length for ordinary events
    pub fn new(buffer: usize) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a channel for a group
    pub fn connect(&self, group_id: &str) -> (ChannelId, mpsc::Receiver<GroupEvent>) {
        // Plus the slot reserved for the terminal event
        let (tx, rx) = mpsc::channel(self.buffer + 1);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        let channels = groups.entry(group_id.to_string()).or_default();
        channels.retain(|_, tx| !tx.is_closed());
        channels.insert(id, tx);
        debug!(
            group_id = %group_id,
            channel = id,
            "Channel connected ({} open)",
            channels.len()
        );

        (id, rx)
    }

    pub fn disconnect(&self, group_id: &str, channel: ChannelId) {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(channels) = groups.get_mut(group_id) {
            channels.remove(&channel);
            if channels.is_empty() {
                groups.remove(group_id);
            }
            debug!(group_id = %group_id, channel, "Channel disconnected");
        }
    }

    /// Deliver to every channel of the group; returns how many accepted it
    pub fn broadcast(&self, group_id: &str, event: GroupEvent) -> usize {
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        let Some(channels) = groups.get(group_id) else {
            return 0;
        };

        let terminal = event.is_terminal();
        let mut delivered = 0;
        for (id, tx) in channels {
            match tx.try_reserve() {
                // Ordinary events may not take the last free slot
                Ok(permit) if !terminal && tx.capacity() == 0 => {
                    drop(permit);
                    warn!(
                        group_id = %group_id,
                        channel = id,
                        "Channel full, dropping {}",
                        event.event_type()
                    );
                }
                Ok(permit) => {
                    permit.send(event.clone());
                    delivered += 1;
                }
                Err(mpsc::error::TrySendError::Full(())) => {
                    warn!(
                        group_id = %group_id,
                        channel = id,
                        "Channel full, dropping {}",
                        event.event_type()
                    );
                }
                Err(mpsc::error::TrySendError::Closed(())) => {}
            }
        }
        debug!(
            group_id = %group_id,
            "Broadcast {} to {} channel(s)",
            event.event_type(),
            delivered
        );
        delivered
    }

    /// Close every channel of the group and forget it; returns how many were open
    pub fn close_all(&self, group_id: &str) -> usize {
        let removed = self
            .groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(group_id);
        // Dropping the senders ends each receiver once it drains
        let count = removed.map(|c| c.len()).unwrap_or(0);
        if count > 0 {
            debug!(group_id = %group_id, "Closed {} channel(s)", count);
        }
        count
    }

    pub fn channel_count(&self, group_id: &str) -> usize {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(group_id)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnm_common::GroupStatus;

    fn joined() -> GroupEvent {
        GroupEvent::user_joined(GroupStatus { total: 1, ready: 0 })
    }

    #[tokio::test]
    async fn test_broadcast_reaches_only_that_group() {
        let hub = BroadcastHub::new(8);
        let (_, mut a) = hub.connect("g1");
        let (_, mut b) = hub.connect("g1");
        let (_, mut other) = hub.connect("g2");

        assert_eq!(hub.broadcast("g1", joined()), 2);
        assert_eq!(a.recv().await, Some(joined()));
        assert_eq!(b.recv().await, Some(joined()));
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dead_channel_does_not_block_others() {
        let hub = BroadcastHub::new(1);
        let (_, dead) = hub.connect("g1");
        let (_, mut full) = hub.connect("g1");
        let (_, mut live) = hub.connect("g1");
        drop(dead);

        // Fill `full` so the next send finds it at capacity
        assert_eq!(hub.broadcast("g1", joined()), 2);
        assert_eq!(live.recv().await, Some(joined()));

        assert_eq!(hub.broadcast("g1", GroupEvent::ResultComputed), 1);
        assert_eq!(live.recv().await, Some(GroupEvent::ResultComputed));
        assert_eq!(full.recv().await, Some(joined()));
    }

    #[tokio::test]
    async fn test_close_all_ends_receivers() {
        let hub = BroadcastHub::new(8);
        let (_, mut rx) = hub.connect("g1");
        hub.broadcast("g1", GroupEvent::session_closing());

        assert_eq!(hub.close_all("g1"), 1);
        assert_eq!(rx.recv().await, Some(GroupEvent::session_closing()));
        assert_eq!(rx.recv().await, None);
        assert_eq!(hub.channel_count("g1"), 0);
        assert_eq!(hub.broadcast("g1", joined()), 0);
    }

    #[test]
    fn test_disconnect_forgets_channel() {
        let hub = BroadcastHub::new(8);
        let (id, _rx) = hub.connect("g1");
        assert_eq!(hub.channel_count("g1"), 1);

        hub.disconnect("g1", id);
        assert_eq!(hub.channel_count("g1"), 0);
    }

    #[tokio::test]
    async fn test_full_channel_still_gets_terminal_event() {
        let hub = BroadcastHub::new(2);
        let (_, mut slow) = hub.connect("g1");

        assert_eq!(hub.broadcast("g1", joined()), 1);
        assert_eq!(hub.broadcast("g1", joined()), 1);
        // Ordinary buffer is full; the reserved slot is kept back
        assert_eq!(hub.broadcast("g1", GroupEvent::ResultComputed), 0);
        assert_eq!(hub.broadcast("g1", GroupEvent::session_expired()), 1);
        hub.close_all("g1");

        assert_eq!(slow.recv().await, Some(joined()));
        assert_eq!(slow.recv().await, Some(joined()));
        assert_eq!(slow.recv().await, Some(GroupEvent::session_expired()));
        assert_eq!(slow.recv().await, None);
    }

    #[test]
    fn test_connect_prunes_closed_channels() {
        let hub = BroadcastHub::new(8);
        let (_, gone) = hub.connect("g1");
        drop(gone);
        let (_, _rx) = hub.connect("g1");
        assert_eq!(hub.channel_count("g1"), 1);
    }
}
