//! Leaderboard cache service.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! connects to MySQL, then runs the refresh loop and the HTTP server
//! side by side until Ctrl+C or a fail-fast refresh error.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use leaderboard::api;
use leaderboard::cache::Caches;
use leaderboard::config::AppConfig;
use leaderboard::engine::{ErrorPolicy, Refresher, REFRESH_INTERVAL};
use leaderboard::store::MySqlStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = AppConfig::load_or_default(AppConfig::path_from_env())?;
    info!(
        port = cfg.server.port,
        database = %cfg.database.name,
        refresh_secs = REFRESH_INTERVAL.as_secs(),
        fail_fast = cfg.refresh.fail_fast,
        "Leaderboard starting up"
    );

    // -- Database --------------------------------------------------------

    let credentials = cfg.credentials()?;
    let store = MySqlStore::connect(&cfg.database.socket, &cfg.database.name, &credentials)
        .await
        .context("Failed to connect to MySQL")?;

    // -- Refresh loop + HTTP server ---------------------------------------

    let caches = Arc::new(Caches::new());
    let refresher = Refresher::new(
        Arc::new(store),
        Arc::clone(&caches),
        ErrorPolicy::from_fail_fast(cfg.refresh.fail_fast),
    );
    let mut refresh_task = refresher.spawn();

    let server = api::serve(Arc::clone(&caches), cfg.server.port, shutdown_signal());
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => {
            refresh_task.abort();
            res?;
            info!("Leaderboard shut down cleanly.");
        }
        res = &mut refresh_task => {
            let res = res.context("Refresh task panicked")?;
            if let Err(e) = res {
                error!(error = %format!("{e:#}"), "Refresh loop terminated");
                return Err(e);
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("leaderboard=info"));

    let json_logging = std::env::var("LEADERBOARD_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
