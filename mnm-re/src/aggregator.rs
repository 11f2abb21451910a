//! Preference aggregation
//!
//! Folds the preference sets of every ready participant into one
//! [`GroupSignal`]:
//! - cuisine, restaurant-type and dish frequency maps
//! - median budget over participants that gave one
//! - mean of every resolvable participant location

use mnm_common::{Coordinates, PreferenceSet};
use tracing::debug;

use crate::frequency::FrequencyMap;
use crate::gazetteer::Gazetteer;

/// Aggregated, weighted preference of a whole group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSignal {
    pub cuisine_weights: FrequencyMap,
    pub type_weights: FrequencyMap,
    pub dish_weights: FrequencyMap,
    /// Median budget; None when nobody gave one
    pub budget: Option<u32>,
    pub centroid: Coordinates,
    /// False when no location resolved and the fallback centroid is in use
    pub centroid_resolved: bool,
}

/// Builds a [`GroupSignal`] from preference sets
pub struct PreferenceAggregator<'a> {
    gazetteer: &'a Gazetteer,
    fallback_centroid: Coordinates,
}

impl<'a> PreferenceAggregator<'a> {
    pub fn new(gazetteer: &'a Gazetteer, fallback_centroid: Coordinates) -> Self {
        Self {
            gazetteer,
            fallback_centroid,
        }
    }

    pub fn aggregate(&self, preferences: &[PreferenceSet]) -> GroupSignal {
        let mut cuisine_weights = FrequencyMap::new();
        let mut type_weights = FrequencyMap::new();
        let mut dish_weights = FrequencyMap::new();
        let mut budgets = Vec::new();
        let mut points = Vec::new();

        for prefs in preferences {
            // Tag lists are canonicalized at submission; CLI input may not be
            let prefs = prefs.clone().normalized();

            prefs.cuisines.iter().for_each(|c| cuisine_weights.add(c));
            prefs.restaurant_types.iter().for_each(|t| type_weights.add(t));
            prefs.dish_preferences.iter().for_each(|d| dish_weights.add(d));

            if prefs.budget > 0 {
                budgets.push(prefs.budget);
            }

            match self.gazetteer.resolve(&prefs.location) {
                Some(point) => points.push(point),
                None => debug!(location = ?prefs.location, "Participant location did not resolve"),
            }
        }

        let (centroid, centroid_resolved) = match Coordinates::centroid(points) {
            Some(c) => (c, true),
            None => (self.fallback_centroid, false),
        };

        GroupSignal {
            cuisine_weights,
            type_weights,
            dish_weights,
            budget: median(&mut budgets),
            centroid,
            centroid_resolved,
        }
    }
}

/// Integer median; an even count takes the truncated mean of the middle pair
fn median(values: &mut [u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let sum = u64::from(values[mid - 1]) + u64::from(values[mid]);
        Some((sum / 2) as u32)
    }
}
