//! Recommendation pipeline
//!
//! Owns the static assets and the fitted text index; each call to
//! [`Recommender::recommend`] is pure and deterministic.

use std::time::Instant;

use mnm_common::config::RecommenderConfig;
use mnm_common::{Coordinates, PreferenceSet, RankedRestaurant};
use tracing::{debug, info};

use crate::aggregator::PreferenceAggregator;
use crate::branch_resolver::BranchResolver;
use crate::catalog::CatalogStore;
use crate::error::{EngineError, EngineResult};
use crate::gazetteer::Gazetteer;
use crate::scoring::ScoringEngine;
use crate::text_index::TextSimilarityIndex;

/// Ranking parameters
#[derive(Debug, Clone)]
pub struct RecommenderParams {
    pub candidate_pool: usize,
    pub top_k: usize,
    pub max_distance_km: f64,
    pub fallback_centroid: Coordinates,
}

impl Default for RecommenderParams {
    fn default() -> Self {
        Self::from(&RecommenderConfig::default())
    }
}

impl From<&RecommenderConfig> for RecommenderParams {
    fn from(config: &RecommenderConfig) -> Self {
        let [lat, lng] = config.fallback_centroid;
        Self {
            candidate_pool: config.candidate_pool,
            top_k: config.top_k,
            max_distance_km: config.max_distance_km,
            fallback_centroid: Coordinates::new(lat, lng),
        }
    }
}

/// Ranks restaurants for a group's preference sets
///
/// Implementations are synchronous and may be CPU-bound.
pub trait Ranker: Send + Sync {
    fn rank(&self, preferences: &[PreferenceSet]) -> EngineResult<Vec<RankedRestaurant>>;
}

pub struct Recommender {
    gazetteer: Gazetteer,
    catalog: CatalogStore,
    index: TextSimilarityIndex,
    params: RecommenderParams,
}

impl Recommender {
    /// Fit the dish index over the catalog and assemble the pipeline
    pub fn new(gazetteer: Gazetteer, catalog: CatalogStore, params: RecommenderParams) -> Self {
        let corpus: Vec<String> = catalog.brands().iter().map(|b| b.dish_document()).collect();
        let index = TextSimilarityIndex::fit(&corpus);

        info!(
            brands = catalog.brands().len(),
            branches = catalog.branch_count(),
            places = gazetteer.len(),
            vocabulary = index.vocabulary_size(),
            "Recommender ready"
        );

        Self {
            gazetteer,
            catalog,
            index,
            params,
        }
    }

    pub fn params(&self) -> &RecommenderParams {
        &self.params
    }

    /// Rank restaurants for a group
    ///
    /// An empty list is a valid outcome (nothing within range).
    pub fn recommend(&self, preferences: &[PreferenceSet]) -> EngineResult<Vec<RankedRestaurant>> {
        if preferences.is_empty() {
            return Err(EngineError::Internal("no preference sets to aggregate".to_string()));
        }
        let started = Instant::now();

        let signal = PreferenceAggregator::new(&self.gazetteer, self.params.fallback_centroid)
            .aggregate(preferences);
        debug!(
            cuisines = signal.cuisine_weights.len(),
            types = signal.type_weights.len(),
            dishes = signal.dish_weights.len(),
            budget = ?signal.budget,
            centroid_resolved = signal.centroid_resolved,
            "Group signal aggregated"
        );

        let candidates = ScoringEngine::new(&self.catalog, &self.index)
            .top_candidates(&signal, self.params.candidate_pool);

        let ranked = BranchResolver::new(&self.catalog, &self.gazetteer, self.params.max_distance_km)
            .resolve(&candidates, signal.centroid, self.params.top_k)?;

        info!(
            participants = preferences.len(),
            candidates = candidates.len(),
            results = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recommendation computed"
        );
        Ok(ranked)
    }
}

impl Ranker for Recommender {
    fn rank(&self, preferences: &[PreferenceSet]) -> EngineResult<Vec<RankedRestaurant>> {
        self.recommend(preferences)
    }
}
