//! # pomoloot-server
//!
//! HTTP API for Pomoloot, a personal time tracker that pays out collectibles.
//!
//! This binary provides:
//! - **Accounts and sessions** (register, login, bearer-token middleware)
//! - **Time tracking** (activities, categories, tags, a single running timer
//!   per user, period summaries)
//! - **Rewards**: every 15 tracked minutes earns one roulette spin over the
//!   Data Dragon catalog, with champion mastery on repeat draws
//! - **Catalog refresh** from Riot's Data Dragon CDN, in the background and
//!   on demand through an admin endpoint

mod api;
mod auth;
mod config;
mod datadragon;
mod error;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pomoloot_shared::CatalogStore;
use pomoloot_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::datadragon::{refresh_catalog, DataDragon};

/// How often expired sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pomoloot_server=debug")),
        )
        .init();

    info!("Starting Pomoloot server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        catalog_fetch = config.catalog_fetch,
        catalog_refresh_secs = config.catalog_refresh_secs,
        admin_enabled = config.admin_token.is_some(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let catalog = Arc::new(CatalogStore::default());
    let dragon = DataDragon::new(config.data_dragon_url.clone())?;

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, catalog, dragon, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Catalog: fetch once now, then on a fixed period. Claims return 503 for
    // empty buckets until the first fetch lands.
    if app_state.config.catalog_fetch {
        let state = app_state.clone();
        let period = state.config.catalog_refresh_secs;
        tokio::spawn(async move {
            if period == 0 {
                if let Err(e) = refresh_catalog(&state.dragon, &state.catalog).await {
                    warn!(error = %e, "Initial catalog fetch failed");
                }
                return;
            }

            // The first tick fires immediately.
            let mut interval = tokio::time::interval(Duration::from_secs(period));
            loop {
                interval.tick().await;
                if let Err(e) = refresh_catalog(&state.dragon, &state.catalog).await {
                    warn!(error = %e, "Catalog refresh failed, keeping current snapshot");
                }
            }
        });
    } else {
        warn!("CATALOG_FETCH disabled; catalog stays empty until /api/catalog/refresh");
    }

    // Periodic session cleanup
    let db = Arc::clone(&app_state.db);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = db.lock().await.purge_expired_sessions(Utc::now());
            match purged {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "Expired sessions removed"),
                Err(e) => warn!(error = %e, "Session purge failed"),
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
