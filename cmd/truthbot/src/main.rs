//! # TruthBot server
//!
//! Loads settings, picks a store, wires the services and serves the router
//! until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{build_router, AppState, HttpMetrics};
use auth_adapters::{Argon2Hasher, JwtTokenService};
use configs::Settings;
use domains::{AnalysisRepository, DiscussionRepository, UserRepository};
use llm_adapters::{ClientOptions, OpenAiCompatibleClient};
use services::{AnalysisService, AuthService, DiscussionService, Gateway};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct Repositories {
    users: Arc<dyn UserRepository>,
    discussions: Arc<dyn DiscussionRepository>,
    analyses: Arc<dyn AnalysisRepository>,
}

impl Repositories {
    fn from_store<S>(store: S) -> Self
    where
        S: UserRepository + DiscussionRepository + AnalysisRepository + Clone + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            discussions: Arc::new(store.clone()),
            analyses: Arc::new(store),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    // Process-wide rustls provider, before any TLS client is built.
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    let repos = open_store(&settings).await?;

    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenService::new(
        &settings.auth.jwt_secret,
        chrono::Duration::minutes(settings.auth.token_ttl_minutes),
    ));

    let llm = OpenAiCompatibleClient::new(ClientOptions {
        base_url: settings.llm.base_url.clone(),
        model: settings.llm.model.clone(),
        api_key: settings.llm.api_key.clone(),
        timeout: settings.llm.timeout(),
        referer: settings.llm.referer.clone(),
        app_title: settings.llm.app_title.clone(),
    })
    .context("building language model client")?;
    if llm.is_configured() {
        info!(model = llm.model(), "language model configured");
    } else {
        warn!("OPENROUTER_API_KEY is not set; chat fails, scoring records errors, quiz serves fallback questions");
    }
    let gateway = Gateway::new(Arc::new(llm));

    let state = AppState {
        auth: Arc::new(AuthService::new(repos.users, hasher, tokens)),
        discussions: Arc::new(DiscussionService::new(repos.discussions.clone(), repos.analyses.clone())),
        analyses: Arc::new(AnalysisService::new(repos.discussions, repos.analyses, gateway.clone())),
        gateway,
        metrics: Arc::new(HttpMetrics::new()),
    };
    let app = build_router(state, settings.api_prefix());

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    info!(%addr, api_prefix = settings.api_prefix(), "🚀 TruthBot listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shut down cleanly");
    Ok(())
}

/// `RUST_LOG` wins over `log.level`.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if settings.log.json { builder.json().try_init() } else { builder.try_init() };
    if let Err(e) = result {
        eprintln!("tracing init failed: {e}");
    }
}

#[cfg(feature = "db-postgres")]
async fn open_store(settings: &Settings) -> anyhow::Result<Repositories> {
    use storage_adapters::PgStore;

    let Some(url) = settings.database_url() else {
        warn!("DATABASE_URL is not set; using the in-memory store, data is lost on exit");
        return Ok(Repositories::from_store(MemoryStore::new()));
    };
    let store = PgStore::connect(url, settings.database.max_connections)
        .await
        .context("connecting to PostgreSQL")?;
    store.migrate().await.context("running migrations")?;
    Ok(Repositories::from_store(store))
}

#[cfg(not(feature = "db-postgres"))]
async fn open_store(settings: &Settings) -> anyhow::Result<Repositories> {
    if settings.database_url().is_some() {
        warn!("DATABASE_URL ignored: built without the db-postgres feature");
    }
    Ok(Repositories::from_store(MemoryStore::new()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
