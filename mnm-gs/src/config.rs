//! Service configuration
//!
//! Command-line flags (each with an `MNM_*` environment fallback) override
//! the TOML bootstrap file, which overrides compiled defaults.

use std::path::PathBuf;

use clap::Parser;
use mnm_common::config::TomlConfig;

pub const MODULE_NAME: &str = "mnm-gs";

/// Command-line arguments for mnm-gs
#[derive(Parser, Debug, Default)]
#[command(name = "mnm-gs")]
#[command(about = "MeetNMeal group session service")]
#[command(version)]
pub struct Args {
    /// TOML config file (default: ~/.config/mnm/mnm-gs.toml, /etc/mnm/mnm-gs.toml)
    #[arg(short, long, env = "MNM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "MNM_PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "MNM_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Directory holding the recommender assets
    #[arg(short, long, env = "MNM_ASSETS_DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Redis URL for a shared group store
    #[arg(long, env = "MNM_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Group lifetime in seconds, refreshed on every write
    #[arg(long, env = "MNM_SESSION_TTL_SECS")]
    pub session_ttl_secs: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "MNM_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Load the TOML file and apply every flag that was given
    pub fn resolve(&self) -> mnm_common::Result<TomlConfig> {
        let mut config = TomlConfig::load(self.config.as_deref(), MODULE_NAME)?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut TomlConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind_address) = &self.bind_address {
            config.bind_address = bind_address.clone();
        }
        if let Some(assets_dir) = &self.assets_dir {
            config.assets_dir = assets_dir.clone();
        }
        if let Some(redis_url) = &self.redis_url {
            config.redis_url = Some(redis_url.clone());
        }
        if let Some(ttl) = self.session_ttl_secs {
            config.session_ttl_secs = ttl;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
