//! Branch resolution and final ranking
//!
//! For each candidate brand, picks the branch nearest the group centroid
//! among branches whose location the gazetteer knows, drops candidates that
//! are out of range, and ranks the rest with a distance bonus added to the
//! base score.

use mnm_common::{haversine_km, Coordinates, RankedRestaurant};
use tracing::debug;

use crate::catalog::{BranchRow, CatalogStore};
use crate::error::{EngineError, EngineResult};
use crate::gazetteer::Gazetteer;
use crate::scoring::{rank_order, ScoredBrand};

/// Weight of the distance bonus in the final score
pub const DISTANCE_WEIGHT: f64 = 0.30;

pub struct BranchResolver<'a> {
    catalog: &'a CatalogStore,
    gazetteer: &'a Gazetteer,
    max_distance_km: f64,
}

impl<'a> BranchResolver<'a> {
    pub fn new(catalog: &'a CatalogStore, gazetteer: &'a Gazetteer, max_distance_km: f64) -> Self {
        Self {
            catalog,
            gazetteer,
            max_distance_km,
        }
    }

    /// Nearest resolvable branch of a brand and its distance in km
    ///
    /// Ties keep the branch that appears first in the branch table.
    pub fn nearest_branch(
        &self,
        brand_name: &str,
        centroid: Coordinates,
    ) -> Option<(&'a BranchRow, f64)> {
        let mut best: Option<(&'a BranchRow, f64)> = None;
        for branch in self.catalog.branches_of(brand_name) {
            let Some(point) = self.gazetteer.lookup(&branch.location) else {
                continue;
            };
            let d = haversine_km(point, centroid);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((branch, d));
            }
        }
        best
    }

    /// Rank candidates by final score and keep the best `top_k`
    pub fn resolve(
        &self,
        candidates: &[ScoredBrand],
        centroid: Coordinates,
        top_k: usize,
    ) -> EngineResult<Vec<RankedRestaurant>> {
        let mut ranked = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let brand = self
                .catalog
                .brand(candidate.brand_index)
                .filter(|b| b.name == candidate.name)
                .ok_or_else(|| EngineError::UnknownBrand(candidate.name.clone()))?;

            let Some((branch, distance_km)) = self.nearest_branch(&brand.name, centroid) else {
                debug!(brand = %brand.name, "No branch with a known location");
                continue;
            };
            if distance_km > self.max_distance_km {
                debug!(
                    brand = %brand.name,
                    distance_km,
                    "Nearest branch out of range"
                );
                continue;
            }

            let distance_score = 1.0 / (distance_km + 1.0);
            let final_score_adjusted = candidate.base_score + DISTANCE_WEIGHT * distance_score;

            ranked.push(RankedRestaurant {
                name: brand.name.clone(),
                location: branch.location.clone(),
                rate: branch.rate,
                cuisines: if branch.cuisines.is_empty() {
                    brand.cuisines.clone()
                } else {
                    branch.cuisines.clone()
                },
                restaurant_types: if branch.restaurant_types.is_empty() {
                    brand.restaurant_types.clone()
                } else {
                    branch.restaurant_types.clone()
                },
                approx_cost: branch.approx_cost.or(Some(brand.approx_cost_for_two)),
                cuisine_score: candidate.cuisine_score,
                restaurant_type_score: candidate.restaurant_type_score,
                dish_score: candidate.dish_score,
                rating_score: candidate.rating_score,
                cost_score: candidate.cost_score,
                distance_km,
                distance_score,
                final_score_adjusted,
            });
        }

        ranked.sort_by(|a, b| {
            rank_order(
                a.final_score_adjusted,
                &a.name,
                b.final_score_adjusted,
                &b.name,
            )
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }
}
