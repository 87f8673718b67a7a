// API server implementation using actix-web

use std::sync::Arc;

use crate::api::{middleware, routes};
use crate::collector::{collect, CollectError, CollectPlan, CollectionSummary};
use crate::config::AppConfig;
use crate::sources::{DetailSource, Pacer, TagSource, TokioPacer};
use crate::store::CacheStore;
use crate::util::env::{env_opt, env_parse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tokio::sync::Mutex;

/// Everything a collection run needs besides the cache.
#[derive(Clone)]
pub struct Sources {
    pub spy: Arc<dyn TagSource>,
    pub store: Arc<dyn DetailSource>,
    pub pacer: Arc<dyn Pacer>,
}

impl Sources {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            spy: Arc::new(config.steamspy()?),
            store: Arc::new(config.steam_store()?),
            pacer: Arc::new(TokioPacer),
        })
    }
}

/// Shared handler state.
pub struct AppState {
    pub cache: CacheStore,
    pub plan: CollectPlan,
    pub cron_secret: Option<String>,
    pub sources: Sources,
    running: Mutex<()>,
}

/// A collection was requested while another was still running.
#[derive(Debug)]
pub struct AlreadyRunning;

impl AppState {
    pub fn new(
        cache: CacheStore,
        plan: CollectPlan,
        cron_secret: Option<String>,
        sources: Sources,
    ) -> Self {
        Self {
            cache,
            plan,
            cron_secret,
            sources,
            running: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            config.cache_store(),
            config.collect_plan(),
            config.cron_secret.clone(),
            Sources::from_config(config)?,
        ))
    }

    /// Runs one collection unless another is in flight in this process.
    pub async fn run_collection(
        &self,
    ) -> Result<Result<CollectionSummary, CollectError>, AlreadyRunning> {
        let Ok(_guard) = self.running.try_lock() else {
            return Err(AlreadyRunning);
        };
        Ok(collect(
            &self.plan,
            self.sources.spy.as_ref(),
            self.sources.store.as_ref(),
            self.sources.pacer.as_ref(),
            &self.cache,
        )
        .await)
    }
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub config: AppConfig,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_opt("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .trim()
            .parse()
            .context("Invalid API_PORT")?;
        let allowed_origins = env_opt("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:8080".to_string());
        let config = AppConfig::from_env().context("loading configuration")?;

        if config.cron_secret.is_none() {
            tracing::warn!("CRON_SECRET is not set; the collection trigger is disabled");
        }
        Ok(Self {
            host,
            port,
            allowed_origins,
            config,
        })
    }

    /// Start the HTTP server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            cache = %self.config.cache.path.display(),
            "Starting survive-base API server"
        );

        let state = web::Data::new(AppState::from_config(&self.config)?);
        let allowed_origins = self.allowed_origins.clone();

        let mut server = HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        });
        let workers = env_parse("API_WORKERS", 0usize);
        if workers > 0 {
            server = server.workers(workers);
        }

        server
            .bind(&bind_addr)
            .with_context(|| format!("Failed to bind to {}", bind_addr))?
            .run()
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
