//! HTTP API handlers for mnm-gs
//!
//! JSON request/response routes for the group operations, plus one SSE
//! stream per group for notifications.

pub mod events;
pub mod groups;
pub mod health;

pub use events::event_routes;
pub use groups::group_routes;
pub use health::health_routes;
