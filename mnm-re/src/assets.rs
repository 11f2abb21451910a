//! Static asset loading
//!
//! An assets directory holds three JSON files:
//! - `gazetteer.json`: `{"<place>": [lat, lng], ...}`
//! - `brands.json`: array of [`BrandRow`]
//! - `branches.json`: array of [`BranchRow`]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mnm_common::Coordinates;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::catalog::{BranchRow, BrandRow, CatalogStore};
use crate::error::{EngineError, EngineResult};
use crate::gazetteer::Gazetteer;
use crate::recommender::{Recommender, RecommenderParams};

pub const GAZETTEER_FILE: &str = "gazetteer.json";
pub const BRANDS_FILE: &str = "brands.json";
pub const BRANCHES_FILE: &str = "branches.json";

fn read_json<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
    if !path.exists() {
        return Err(EngineError::Asset(format!(
            "asset file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| EngineError::Asset(format!("{}: {}", path.display(), e)))
}

pub fn load_gazetteer(path: &Path) -> EngineResult<Gazetteer> {
    let places: BTreeMap<String, [f64; 2]> = read_json(path)?;
    Ok(Gazetteer::new(
        places
            .into_iter()
            .map(|(name, [lat, lng])| (name, Coordinates::new(lat, lng))),
    ))
}

pub fn load_catalog(brands_path: &Path, branches_path: &Path) -> EngineResult<CatalogStore> {
    let brands: Vec<BrandRow> = read_json(brands_path)?;
    let branches: Vec<BranchRow> = read_json(branches_path)?;
    if brands.is_empty() {
        return Err(EngineError::Asset(format!(
            "{} holds no brands",
            brands_path.display()
        )));
    }
    Ok(CatalogStore::new(brands, branches))
}

impl Recommender {
    /// Load every asset from `dir` and fit the pipeline
    pub fn from_assets_dir(dir: &Path, params: RecommenderParams) -> EngineResult<Self> {
        let dir: PathBuf = dir.to_path_buf();
        info!("Loading recommender assets from {}", dir.display());

        let gazetteer = load_gazetteer(&dir.join(GAZETTEER_FILE))?;
        let catalog = load_catalog(&dir.join(BRANDS_FILE), &dir.join(BRANCHES_FILE))?;
        Ok(Recommender::new(gazetteer, catalog, params))
    }
}
