use std::sync::{Arc, Mutex as StdMutex};

use axum::{
    http::Method,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use pomoloot_shared::{CatalogStore, RandomSource, SystemRandom};
use pomoloot_store::{Database, LabelKind};

use crate::auth::{self, require_user};
use crate::config::ServerConfig;
use crate::datadragon::DataDragon;
use crate::routes::{activities, catalog, labels, rewards, timer};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub catalog: Arc<CatalogStore>,
    pub dragon: Arc<DataDragon>,
    /// Roulette randomness. Swappable so tests can script rolls.
    pub rng: Arc<StdMutex<Box<dyn RandomSource + Send>>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        db: Database,
        catalog: Arc<CatalogStore>,
        dragon: DataDragon,
        config: ServerConfig,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            catalog,
            dragon: Arc::new(dragon),
            rng: Arc::new(StdMutex::new(Box::new(SystemRandom::new()))),
            config: Arc::new(config),
        }
    }

    pub fn with_rng(mut self, rng: impl RandomSource + Send + 'static) -> Self {
        self.rng = Arc::new(StdMutex::new(Box::new(rng)));
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let authenticated = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route("/api/activities/stats", get(activities::activity_stats))
        .route(
            "/api/activities/:id",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route("/api/activities/:id/time", get(activities::activity_time))
        .route("/api/time-entries/start", post(timer::start_timer))
        .route("/api/time-entries/stop", post(timer::stop_timer))
        .route("/api/time-entries/active", get(timer::active_timer))
        .route("/api/time-entries/:id", delete(timer::delete_time_entry))
        .route("/api/resume", get(timer::resume))
        .route("/api/rewards", get(rewards::list_rewards))
        .route("/api/rewards/status", get(rewards::reward_status))
        .route("/api/rewards/claim", post(rewards::claim_reward))
        .route("/api/catalog", get(catalog::catalog_info))
        .merge(labels::routes(LabelKind::Category))
        .merge(labels::routes(LabelKind::Tag))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/catalog/refresh", post(catalog::refresh))
        .merge(authenticated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
