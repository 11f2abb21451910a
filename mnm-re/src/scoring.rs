//! Brand base scoring
//!
//! Each brand gets five component scores in [0.0, 1.0], combined into a
//! weighted base score:
//!
//! | Component        | Source                                         |
//! |------------------|------------------------------------------------|
//! | cuisine          | tag frequency overlap, normalised by the max   |
//! | restaurant type  | tag frequency overlap, normalised by the max   |
//! | dish             | TF-IDF cosine of the weighted dish query       |
//! | rating           | mean rating / 5                                |
//! | cost             | 1 / (\|cost - budget\| + 1)                    |

use std::cmp::Ordering;

use crate::aggregator::GroupSignal;
use crate::catalog::CatalogStore;
use crate::frequency::FrequencyMap;
use crate::text_index::TextSimilarityIndex;

/// Component weights for the base score
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub cuisine: f64,
    pub restaurant_type: f64,
    pub dish: f64,
    pub rating: f64,
    pub cost: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            cuisine: 0.35,
            restaurant_type: 0.20,
            dish: 0.25,
            rating: 0.10,
            cost: 0.10,
        }
    }
}

/// Score breakdown for one brand
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBrand {
    /// Position of the brand in the catalog
    pub brand_index: usize,
    pub name: String,
    pub cuisine_score: f64,
    pub restaurant_type_score: f64,
    pub dish_score: f64,
    pub rating_score: f64,
    pub cost_score: f64,
    pub base_score: f64,
}

/// Scores every catalog brand against a group signal
pub struct ScoringEngine<'a> {
    catalog: &'a CatalogStore,
    index: &'a TextSimilarityIndex,
    weights: ScoreWeights,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(catalog: &'a CatalogStore, index: &'a TextSimilarityIndex) -> Self {
        Self {
            catalog,
            index,
            weights: ScoreWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Score every brand, in catalog order
    pub fn score_all(&self, signal: &GroupSignal) -> Vec<ScoredBrand> {
        let brands = self.catalog.brands();

        let cuisine = overlap_scores(
            &signal.cuisine_weights,
            brands.iter().map(|b| b.cuisines.as_slice()),
        );
        let rest_type = overlap_scores(
            &signal.type_weights,
            brands.iter().map(|b| b.restaurant_types.as_slice()),
        );
        let dish = self.dish_scores(&signal.dish_weights, brands.len());

        brands
            .iter()
            .enumerate()
            .map(|(i, brand)| {
                let rating_score = unit(brand.mean_rating / 5.0);
                let cost_score = match signal.budget {
                    Some(budget) => {
                        unit(1.0 / ((brand.approx_cost_for_two - f64::from(budget)).abs() + 1.0))
                    }
                    None => 0.0,
                };

                let mut scored = ScoredBrand {
                    brand_index: i,
                    name: brand.name.clone(),
                    cuisine_score: cuisine[i],
                    restaurant_type_score: rest_type[i],
                    dish_score: dish[i],
                    rating_score,
                    cost_score,
                    base_score: 0.0,
                };
                scored.base_score = self.base_score(&scored);
                scored
            })
            .collect()
    }

    /// Best `n` brands by base score, ties by name ascending
    pub fn top_candidates(&self, signal: &GroupSignal, n: usize) -> Vec<ScoredBrand> {
        let mut scored = self.score_all(signal);
        scored.sort_by(|a, b| rank_order(a.base_score, &a.name, b.base_score, &b.name));
        scored.truncate(n);
        scored
    }

    fn base_score(&self, s: &ScoredBrand) -> f64 {
        let w = &self.weights;
        w.cuisine * s.cuisine_score
            + w.restaurant_type * s.restaurant_type_score
            + w.dish * s.dish_score
            + w.rating * s.rating_score
            + w.cost * s.cost_score
    }

    fn dish_scores(&self, dish_weights: &FrequencyMap, brand_count: usize) -> Vec<f64> {
        if dish_weights.is_empty() {
            return vec![0.0; brand_count];
        }
        let query = self.index.transform(&dish_weights.weighted_query());
        (0..brand_count)
            .map(|i| unit(self.index.cosine(&query, i)))
            .collect()
    }
}

/// Descending by score, then ascending by name
pub(crate) fn rank_order(a_score: f64, a_name: &str, b_score: f64, b_name: &str) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_name.cmp(b_name))
}

/// Per-brand tag overlap divided by the maximum overlap over all brands
fn overlap_scores<'b, I>(weights: &FrequencyMap, tag_lists: I) -> Vec<f64>
where
    I: Iterator<Item = &'b [String]>,
{
    let raw: Vec<u32> = tag_lists.map(|tags| weights.overlap(tags)).collect();
    let max = raw.iter().copied().max().unwrap_or(0);
    if weights.is_empty() || max == 0 {
        return vec![0.0; raw.len()];
    }
    raw.into_iter()
        .map(|v| unit(f64::from(v) / f64::from(max)))
        .collect()
}

/// Clamp into [0, 1]; NaN becomes 0
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
