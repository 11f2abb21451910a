//! Group session records
//!
//! These are the values persisted in the group store. Field sets are fixed;
//! a stored record that does not decode into these types (or that violates
//! the participant readiness invariant) is rejected rather than defaulted.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::normalize::normalize_tags;

/// Lifecycle state of a group, derived from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupState {
    /// Accepting joins and submissions
    Open,
    /// Result stored, immutable
    Computed,
    /// Closed by request, awaiting removal
    Closed,
}

/// Where a participant wants to eat: a gazetteer place name or explicit coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Coordinates(Coordinates),
    Named(String),
}

/// One participant's dining preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSet {
    #[serde(default)]
    pub cuisines: Vec<String>,

    #[serde(default, rename = "rest_type", alias = "restaurant_types")]
    pub restaurant_types: Vec<String>,

    #[serde(default, rename = "dish_pref", alias = "dish_preferences")]
    pub dish_preferences: Vec<String>,

    /// Approximate spend for two people; 0 means no budget preference
    #[serde(default)]
    pub budget: u32,

    pub location: LocationInput,
}

impl PreferenceSet {
    /// Canonicalize tag lists and trim free-text dish terms
    pub fn normalized(self) -> Self {
        Self {
            cuisines: normalize_tags(&self.cuisines),
            restaurant_types: normalize_tags(&self.restaurant_types),
            dish_preferences: self
                .dish_preferences
                .iter()
                .map(|d| d.trim().to_string())
                .collect(),
            budget: self.budget,
            location: self.location,
        }
    }
}

/// One user within a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub preferences: Option<PreferenceSet>,
    pub ready: bool,
}

impl Participant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            preferences: None,
            ready: false,
        }
    }

    /// Record preferences and mark ready
    ///
    /// Returns false (and changes nothing) if the participant was already ready.
    pub fn submit(&mut self, preferences: PreferenceSet) -> bool {
        if self.ready {
            return false;
        }
        self.preferences = Some(preferences);
        self.ready = true;
        true
    }
}

/// Participant counts for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatus {
    pub total: usize,
    pub ready: usize,
}

/// One decision session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub participants: BTreeMap<String, Participant>,
    pub result: Option<Vec<RankedRestaurant>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Bumped on every committed write; used for compare-and-set
    #[serde(default)]
    pub revision: u64,
}

impl Group {
    /// Create an empty open group whose lifetime starts now
    pub fn new(id: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            participants: BTreeMap::new(),
            result: None,
            created_at: now,
            expires_at: now + ttl,
            closed_at: None,
            revision: 0,
        }
    }

    pub fn state(&self) -> GroupState {
        if self.closed_at.is_some() {
            GroupState::Closed
        } else if self.result.is_some() {
            GroupState::Computed
        } else {
            GroupState::Open
        }
    }

    pub fn status(&self) -> GroupStatus {
        GroupStatus {
            total: self.participants.len(),
            ready: self.participants.values().filter(|p| p.ready).count(),
        }
    }

    pub fn all_ready(&self) -> bool {
        self.participants.values().all(|p| p.ready)
    }

    /// Preferences of every ready participant
    pub fn ready_preferences(&self) -> Vec<PreferenceSet> {
        self.participants
            .values()
            .filter(|p| p.ready)
            .filter_map(|p| p.preferences.clone())
            .collect()
    }

    /// Check record invariants after decoding
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (key, participant) in &self.participants {
            if key != &participant.id {
                return Err(format!(
                    "participant keyed {} carries id {}",
                    key, participant.id
                ));
            }
            if participant.ready != participant.preferences.is_some() {
                return Err(format!(
                    "participant {} has ready={} but preferences present={}",
                    participant.id,
                    participant.ready,
                    participant.preferences.is_some()
                ));
            }
        }
        Ok(())
    }
}

/// One recommended restaurant branch with its score breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRestaurant {
    /// Brand name
    pub name: String,
    /// Branch location name
    pub location: String,
    pub rate: Option<f64>,
    pub cuisines: Vec<String>,
    pub restaurant_types: Vec<String>,
    pub approx_cost: Option<f64>,

    pub cuisine_score: f64,
    pub restaurant_type_score: f64,
    pub dish_score: f64,
    pub rating_score: f64,
    pub cost_score: f64,

    pub distance_km: f64,
    pub distance_score: f64,
    pub final_score_adjusted: f64,
}

/// Caller-facing projection of a ranked restaurant
///
/// List fields are flattened to comma-joined strings; missing numbers render as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantView {
    pub name: String,
    pub rate: Option<f64>,
    pub cuisines: String,
    pub rest_type: String,
    pub cost: f64,
    pub location: String,
    pub distance_km: f64,
    pub distance_score: f64,
    pub final_score_adjusted: f64,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl From<&RankedRestaurant> for RestaurantView {
    fn from(r: &RankedRestaurant) -> Self {
        Self {
            name: r.name.clone(),
            rate: r.rate.filter(|v| v.is_finite()),
            cuisines: r.cuisines.join(", "),
            rest_type: r.restaurant_types.join(", "),
            cost: r.approx_cost.map(finite_or_zero).unwrap_or(0.0),
            location: r.location.clone(),
            distance_km: finite_or_zero(r.distance_km),
            distance_score: finite_or_zero(r.distance_score),
            final_score_adjusted: finite_or_zero(r.final_score_adjusted),
        }
    }
}
