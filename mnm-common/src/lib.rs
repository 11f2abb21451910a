//! # MeetNMeal Common Library
//!
//! Shared code for the MeetNMeal crates including:
//! - Group session records (Group, Participant, PreferenceSet)
//! - Ranked result types and their display projection
//! - Group notification events (GroupEvent)
//! - Geographic primitives (haversine distance, centroids)
//! - Tag normalization
//! - Bootstrap configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod models;
pub mod normalize;

pub use error::{Error, Result};
pub use events::GroupEvent;
pub use geo::{haversine_km, Coordinates};
pub use models::{
    Group, GroupState, GroupStatus, LocationInput, Participant, PreferenceSet, RankedRestaurant,
    RestaurantView,
};
