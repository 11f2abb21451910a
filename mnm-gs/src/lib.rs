//! # MeetNMeal Group Session service (mnm-gs)
//!
//! Runs group dining decisions: participants join a group, submit
//! preferences, and the group computes one ranked restaurant list.
//!
//! - [`session::SessionStateMachine`]: group lifecycle and its rules
//! - [`store`]: group records with sliding expiry (in-memory or Redis)
//! - [`hub::BroadcastHub`]: per-group notification channels
//! - [`expiry`]: announces expired groups and closes their channels
//! - [`api`]: HTTP + SSE boundary

pub mod api;
pub mod config;
pub mod error;
pub mod expiry;
pub mod hub;
pub mod session;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::session::SessionStateMachine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStateMachine>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionStateMachine>) -> Self {
        Self {
            sessions,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::group_routes())
        .merge(api::event_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
