//! TARA API: REST endpoints for travel checks and profiles
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tara_advisory::{MistralAdvisor, PromptRenderer};
use tara_core::{AdvisoryService, ProfileStore, RequestResolver, RuleStore};
use tara_store::{MemoryProfileStore, SqliteProfileStore, SqliteRuleStore, StaticRuleStore};

pub use config::TaraConfig;
pub use metrics::ApiMetrics;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RequestResolver>,
    pub profiles: Arc<dyn ProfileStore>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        profiles: Arc<dyn ProfileStore>,
        advisory: Arc<dyn AdvisoryService>,
    ) -> anyhow::Result<Self> {
        let resolver = RequestResolver::new(rules, profiles.clone(), advisory);
        Ok(Self {
            resolver: Arc::new(resolver),
            profiles,
            metrics: Arc::new(ApiMetrics::new()?),
        })
    }

    /// Wires the stores and the Mistral client named by `config`.
    pub async fn from_config(config: &TaraConfig) -> anyhow::Result<Self> {
        let advisory = match config.prompts_path.as_deref() {
            Some(path) => {
                tracing::info!(path, "loading prompt templates");
                MistralAdvisor::with_prompts(config.mistral.clone(), PromptRenderer::from_path(path)?)?
            }
            None => MistralAdvisor::new(config.mistral.clone())?,
        };
        let advisory = Arc::new(advisory);
        if !advisory.is_configured() {
            tracing::warn!("MISTRAL_API_KEY not set, advisory answers will use the offline fallback");
        }

        let (rules, profiles): (Arc<dyn RuleStore>, Arc<dyn ProfileStore>) =
            if config.uses_memory_stores() {
                tracing::info!("using in-memory stores");
                (
                    Arc::new(StaticRuleStore::new()),
                    Arc::new(MemoryProfileStore::new()),
                )
            } else {
                tracing::info!(db_path = %config.db_path, "using SQLite stores");
                (
                    Arc::new(SqliteRuleStore::new(&config.db_path)),
                    Arc::new(SqliteProfileStore::new(&config.db_path).await?),
                )
            };

        Self::new(rules, profiles, advisory)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/tourism/check", post(handlers::check))
        .route("/profile/update", post(handlers::update_profile))
        .route("/profile/{user_id}", get(handlers::get_profile))
        .route("/profile/{user_id}/history", get(handlers::history))
        .route("/debug/request", post(handlers::debug_request))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::cors())
        .layer(middleware::trace())
        .with_state(state)
}

pub async fn run(config: TaraConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).await?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    tracing::info!("TARA API listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
