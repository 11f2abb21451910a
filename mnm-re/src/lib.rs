//! # MeetNMeal Recommendation Engine (mnm-re)
//!
//! Turns a group's preference sets into one ranked restaurant list.
//!
//! **Pipeline:** PreferenceAggregator → ScoringEngine → BranchResolver
//!
//! 1. Aggregate per-user preferences into a [`GroupSignal`] (tag frequencies,
//!    median budget, location centroid)
//! 2. Score every catalog brand against the signal and keep the best
//!    candidates
//! 3. Resolve each candidate brand to its branch nearest the group, drop
//!    anything out of range, and produce the final ranking
//!
//! The pipeline is synchronous and CPU-bound; async callers should run
//! [`Recommender::recommend`] on a blocking thread.

pub mod aggregator;
pub mod assets;
pub mod branch_resolver;
pub mod catalog;
pub mod error;
pub mod frequency;
pub mod gazetteer;
pub mod recommender;
pub mod scoring;
pub mod text_index;

pub use aggregator::{GroupSignal, PreferenceAggregator};
pub use branch_resolver::BranchResolver;
pub use catalog::{BranchRow, BrandRow, CatalogStore};
pub use error::{EngineError, EngineResult};
pub use frequency::FrequencyMap;
pub use gazetteer::Gazetteer;
pub use recommender::{Ranker, Recommender, RecommenderParams};
pub use scoring::{ScoreWeights, ScoredBrand, ScoringEngine};
pub use text_index::{SparseVector, TextSimilarityIndex};
