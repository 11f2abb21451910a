//! Group Session service (mnm-gs) - Main entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mnm_common::config::TomlConfig;
use mnm_gs::config::Args;
use mnm_gs::hub::BroadcastHub;
use mnm_gs::session::{SessionConfig, SessionStateMachine};
use mnm_gs::store::{GroupStore, MemoryGroupStore};
use mnm_gs::{build_router, expiry, AppState};
use mnm_re::{Ranker, Recommender, RecommenderParams};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.resolve().context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let default_filter = format!(
        "mnm_gs={level},mnm_re={level},tower_http=info",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MeetNMeal Group Session service v{}", env!("CARGO_PKG_VERSION"));

    // Assets are fitted on the blocking pool
    let assets_dir = config.assets_dir.clone();
    let params = RecommenderParams::from(&config.recommender);
    let recommender = tokio::task::spawn_blocking(move || {
        Recommender::from_assets_dir(&assets_dir, params)
    })
    .await
    .context("Recommender loading task failed")?
    .with_context(|| format!("Failed to load assets from {}", config.assets_dir.display()))?;
    let ranker: Arc<dyn Ranker> = Arc::new(recommender);

    let store = open_store(&config).await?;
    let hub = Arc::new(BroadcastHub::new(config.notification_buffer));
    let _expiry_task = expiry::start(store.as_ref(), Arc::clone(&hub)).await;

    let sessions = Arc::new(SessionStateMachine::new(
        store,
        hub,
        ranker,
        SessionConfig::from(&config),
    ));
    let app = build_router(AppState::new(sessions));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("mnm-gs stopped");
    Ok(())
}

async fn open_store(config: &TomlConfig) -> Result<Arc<dyn GroupStore>> {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        let store = mnm_gs::store::RedisGroupStore::connect(url)
            .await
            .context("Failed to connect to Redis")?;
        let store: Arc<dyn GroupStore> = Arc::new(store);
        return Ok(store);
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        tracing::warn!("redis_url is set but this build has no Redis support; using in-memory store");
    }

    let memory = Arc::new(MemoryGroupStore::new());
    let _sweeper = memory.spawn_sweeper(Duration::from_secs(config.sweep_interval_secs.max(1)));
    info!("Using in-memory group store");
    let store: Arc<dyn GroupStore> = memory;
    Ok(store)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
