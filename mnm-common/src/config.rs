//! Bootstrap configuration loading
//!
//! Resolution order for every setting (highest priority first):
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Steps 1 and 2 are handled by each binary's `clap` arguments; this module
//! covers the TOML file and the compiled defaults. A missing TOML file is not
//! an error (warning + defaults). A malformed one is.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Interface to bind
    pub bind_address: String,

    /// Directory holding gazetteer.json, brands.json and branches.json
    pub assets_dir: PathBuf,

    /// Group lifetime, refreshed on every write
    pub session_ttl_secs: u64,

    /// How long a closed group lingers before it expires
    pub close_grace_secs: u64,

    /// Expiry scan period for the in-memory store
    pub sweep_interval_secs: u64,

    /// Redis connection URL; when set (and built with the `redis` feature)
    /// groups are kept in Redis instead of process memory
    pub redis_url: Option<String>,

    /// Per-channel notification buffer
    pub notification_buffer: usize,

    pub logging: LoggingConfig,

    pub recommender: RecommenderConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            assets_dir: PathBuf::from("./data"),
            session_ttl_secs: 600,
            close_grace_secs: 5,
            sweep_interval_secs: 5,
            redis_url: None,
            notification_buffer: 64,
            logging: LoggingConfig::default(),
            recommender: RecommenderConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Ranking parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Brands carried from base scoring into branch resolution
    pub candidate_pool: usize,

    /// Length of the final ranked list
    pub top_k: usize,

    /// Branches farther than this from the group centroid are discarded
    pub max_distance_km: f64,

    /// Centroid used when no participant location resolves ([lat, lng])
    pub fallback_centroid: [f64; 2],
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 30,
            top_k: 10,
            max_distance_km: 10.0,
            // Bangalore city centre
            fallback_centroid: [12.9716, 77.5946],
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration for a module
    ///
    /// An explicit path must exist. Without one, the platform config
    /// locations are tried and compiled defaults are used when none exist.
    pub fn load(explicit: Option<&Path>, module_name: &str) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_file(path);
        }

        match default_config_paths(module_name).into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_file(&path),
            None => {
                warn!(
                    "No config file found for {}, using compiled defaults",
                    module_name
                );
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .inspect_err(|e| warn!("Failed to read {}: {}", path.display(), e))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Candidate config file locations, in lookup order
///
/// `~/.config/mnm/<module>.toml` first, then `/etc/mnm/<module>.toml`.
pub fn default_config_paths(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut paths = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mnm").join(&file_name));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc/mnm").join(&file_name));
    }

    paths
}
