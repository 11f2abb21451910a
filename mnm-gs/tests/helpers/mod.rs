//! Test Helper Utilities
//!
//! Shared fixtures for testing mnm-gs: a small Bangalore catalog, an
//! in-memory store and a wired-up session state machine.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

pub use doubles::{FlakyGroupStore, Outage, PanickingRanker, UnknownBrandRanker};
pub use fixtures::{prefs, recommender, sessions_over, TestService};
