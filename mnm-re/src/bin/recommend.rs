//! Offline recommender (mnm-recommend)
//!
//! Ranks restaurants for a set of preference sets read from a JSON file,
//! without running the group session service. Results go to stdout as JSON;
//! logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mnm_common::{PreferenceSet, RestaurantView};
use mnm_re::{Recommender, RecommenderParams};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mnm-recommend
#[derive(Parser, Debug)]
#[command(name = "mnm-recommend")]
#[command(about = "Rank restaurants for a group from a preferences file")]
#[command(version)]
struct Args {
    /// Directory holding gazetteer.json, brands.json and branches.json
    #[arg(short, long, default_value = "./data", env = "MNM_ASSETS_DIR")]
    assets: PathBuf,

    /// JSON array of preference sets, one per participant
    #[arg(short, long)]
    users: PathBuf,

    /// Number of restaurants to return
    #[arg(long)]
    top_k: Option<usize>,

    /// Discard restaurants farther than this from the group (km)
    #[arg(long)]
    max_distance_km: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mnm_re=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut params = RecommenderParams::default();
    if let Some(top_k) = args.top_k {
        params.top_k = top_k;
    }
    if let Some(max_distance_km) = args.max_distance_km {
        params.max_distance_km = max_distance_km;
    }

    let recommender = Recommender::from_assets_dir(&args.assets, params)
        .with_context(|| format!("Failed to load assets from {}", args.assets.display()))?;

    let content = std::fs::read_to_string(&args.users)
        .with_context(|| format!("Failed to read {}", args.users.display()))?;
    let preferences: Vec<PreferenceSet> = serde_json::from_str(&content)
        .context("Preferences file is not a JSON array of preference sets")?;
    info!("Loaded {} preference sets", preferences.len());

    let ranked = recommender
        .recommend(&preferences)
        .context("Recommendation failed")?;
    let views: Vec<RestaurantView> = ranked.iter().map(RestaurantView::from).collect();

    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}
