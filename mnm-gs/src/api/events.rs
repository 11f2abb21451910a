//! Server-Sent Events stream of group notifications
//!
//! GET /group/:group_id/events registers one hub channel for the lifetime of
//! the response. Each notification is sent with the event type as the SSE
//! event name and the JSON notification as data. The stream ends when the
//! hub closes the group's channels.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use tracing::{debug, info, warn};

use crate::error::ApiResult;
use crate::hub::{BroadcastHub, ChannelId};
use crate::AppState;

/// Disconnects the channel when the response stream is dropped
struct ChannelGuard {
    hub: Arc<BroadcastHub>,
    group_id: String,
    channel: ChannelId,
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.hub.disconnect(&self.group_id, self.channel);
    }
}

/// GET /group/:group_id/events
pub async fn group_event_stream(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // 404 for unknown or closed groups
    state.sessions.group_status(&group_id).await?;

    let hub = Arc::clone(state.sessions.hub());
    let (channel, mut rx) = hub.connect(&group_id);
    info!(group_id = %group_id, channel, "Notification stream opened");

    let guard = ChannelGuard {
        hub,
        group_id,
        channel,
    };

    let stream = async_stream::stream! {
        let guard = guard;
        while let Some(event) = rx.recv().await {
            let event_type = event.event_type();
            match Event::default().event(event_type).json_data(&event) {
                Ok(sse_event) => {
                    debug!(group_id = %guard.group_id, "SSE: sending {}", event_type);
                    yield Ok(sse_event);
                }
                Err(e) => warn!("SSE: failed to serialize {}: {}", event_type, e),
            }
        }
        info!(group_id = %guard.group_id, "Notification stream closed");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}

/// Build notification stream routes
pub fn event_routes() -> Router<AppState> {
    Router::new().route("/group/:group_id/events", get(group_event_stream))
}
