//! Group notification events
//!
//! Every externally visible session transition produces one of these. They
//! are serialized as JSON objects tagged by `type`, e.g.
//! `{"type": "USER_JOINED", "joined_count": 2, "ready_count": 0}`.

use serde::{Deserialize, Serialize};

use crate::models::GroupStatus;

/// Notification delivered to every live channel of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupEvent {
    /// A participant joined
    UserJoined {
        joined_count: usize,
        ready_count: usize,
    },

    /// A participant submitted preferences
    UserReady {
        user_id: String,
        joined_count: usize,
        ready_count: usize,
    },

    /// The group result was stored
    ResultComputed,

    /// The group was closed on request and will be removed shortly
    SessionClosing { message: String },

    /// The group lapsed and its channels are about to close
    SessionExpired { message: String },
}

impl GroupEvent {
    pub fn user_joined(status: GroupStatus) -> Self {
        Self::UserJoined {
            joined_count: status.total,
            ready_count: status.ready,
        }
    }

    pub fn user_ready(user_id: impl Into<String>, status: GroupStatus) -> Self {
        Self::UserReady {
            user_id: user_id.into(),
            joined_count: status.total,
            ready_count: status.ready,
        }
    }

    pub fn session_closing() -> Self {
        Self::SessionClosing {
            message: "This session is closing.".to_string(),
        }
    }

    pub fn session_expired() -> Self {
        Self::SessionExpired {
            message: "This session has expired.".to_string(),
        }
    }

    /// Last notification a channel receives before it is closed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GroupEvent::SessionClosing { .. } | GroupEvent::SessionExpired { .. }
        )
    }

    /// Wire name of the event, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            GroupEvent::UserJoined { .. } => "USER_JOINED",
            GroupEvent::UserReady { .. } => "USER_READY",
            GroupEvent::ResultComputed => "RESULT_COMPUTED",
            GroupEvent::SessionClosing { .. } => "SESSION_CLOSING",
            GroupEvent::SessionExpired { .. } => "SESSION_EXPIRED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_joined_wire_format() {
        let event = GroupEvent::user_joined(GroupStatus { total: 2, ready: 0 });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"type": "USER_JOINED", "joined_count": 2, "ready_count": 0})
        );
    }

    #[test]
    fn test_result_computed_wire_format() {
        let value = serde_json::to_value(GroupEvent::ResultComputed).unwrap();
        assert_eq!(value, json!({"type": "RESULT_COMPUTED"}));
    }

    #[test]
    fn test_event_type_matches_tag() {
        let events = vec![
            GroupEvent::user_joined(GroupStatus { total: 1, ready: 0 }),
            GroupEvent::user_ready("u1", GroupStatus { total: 1, ready: 1 }),
            GroupEvent::ResultComputed,
            GroupEvent::session_closing(),
            GroupEvent::session_expired(),
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }
}
