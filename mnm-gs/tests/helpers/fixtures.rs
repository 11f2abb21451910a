//! Session service fixtures

use std::sync::Arc;
use std::time::Duration;

use mnm_common::{Coordinates, LocationInput, PreferenceSet};
use mnm_gs::hub::BroadcastHub;
use mnm_gs::session::{SessionConfig, SessionStateMachine};
use mnm_gs::store::{GroupStore, MemoryGroupStore};
use mnm_gs::{build_router, AppState};
use mnm_re::{BranchRow, BrandRow, CatalogStore, Gazetteer, Ranker, Recommender, RecommenderParams};

fn brand(name: &str, cuisines: &[&str], cost: f64, rating: f64, dishes: &[&str]) -> BrandRow {
    BrandRow {
        name: name.to_string(),
        cuisines: cuisines.iter().map(|s| s.to_string()).collect(),
        restaurant_types: vec!["Casual Dining".to_string()],
        approx_cost_for_two: cost,
        mean_rating: rating,
        dishes: dishes.iter().map(|s| s.to_string()).collect(),
    }
}

fn branch(name: &str, location: &str, rate: f64) -> BranchRow {
    BranchRow {
        brand_name: name.to_string(),
        location: location.to_string(),
        rate: Some(rate),
        approx_cost: None,
        cuisines: Vec::new(),
        restaurant_types: Vec::new(),
    }
}

/// Recommender over a handful of Bangalore restaurants
pub fn recommender() -> Arc<Recommender> {
    let gazetteer = Gazetteer::new(vec![
        ("Koramangala", Coordinates::new(12.9352, 77.6245)),
        ("HSR", Coordinates::new(12.9116, 77.6389)),
        ("Indiranagar", Coordinates::new(12.9719, 77.6412)),
        ("Far North", Coordinates::new(13.0700, 77.6245)),
    ]);
    let catalog = CatalogStore::new(
        vec![
            brand("Mainland China", &["Chinese", "Thai"], 1200.0, 4.4, &["dim sum", "noodles"]),
            brand("Beijing Bites", &["Chinese"], 500.0, 3.9, &["noodles", "momos"]),
            brand("Meghana Foods", &["Biryani", "Andhra"], 600.0, 4.3, &["chicken biryani"]),
            brand("Truffles", &["Cafe", "American"], 700.0, 4.5, &["burger", "pasta"]),
            brand("Dragon Far Away", &["Chinese"], 500.0, 5.0, &["noodles"]),
        ],
        vec![
            branch("Mainland China", "Indiranagar", 4.4),
            branch("Beijing Bites", "HSR", 3.9),
            branch("Meghana Foods", "Koramangala", 4.3),
            branch("Truffles", "Koramangala", 4.5),
            branch("Dragon Far Away", "Far North", 5.0),
        ],
    );
    Arc::new(Recommender::new(gazetteer, catalog, RecommenderParams::default()))
}

pub fn prefs(cuisines: &[&str], location: &str) -> PreferenceSet {
    PreferenceSet {
        cuisines: cuisines.iter().map(|s| s.to_string()).collect(),
        restaurant_types: Vec::new(),
        dish_preferences: Vec::new(),
        budget: 600,
        location: LocationInput::Named(location.to_string()),
    }
}

/// Session state machine over any store and ranker
pub fn sessions_over(
    store: Arc<dyn GroupStore>,
    ranker: Arc<dyn Ranker>,
) -> Arc<SessionStateMachine> {
    Arc::new(SessionStateMachine::new(
        store,
        Arc::new(BroadcastHub::new(16)),
        ranker,
        SessionConfig {
            session_ttl: Duration::from_secs(600),
            close_grace: Duration::from_secs(5),
        },
    ))
}

/// Session state machine wired to an in-memory store
pub struct TestService {
    pub store: Arc<MemoryGroupStore>,
    pub hub: Arc<BroadcastHub>,
    pub sessions: Arc<SessionStateMachine>,
}

impl TestService {
    pub fn new() -> Self {
        Self::with_config(SessionConfig {
            session_ttl: Duration::from_secs(600),
            close_grace: Duration::from_secs(5),
        })
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let store = Arc::new(MemoryGroupStore::new());
        let hub = Arc::new(BroadcastHub::new(16));
        let sessions = Arc::new(SessionStateMachine::new(
            store.clone(),
            Arc::clone(&hub),
            recommender(),
            config,
        ));
        Self {
            store,
            hub,
            sessions,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(Arc::clone(&self.sessions)))
    }
}
