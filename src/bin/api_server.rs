// HTTP API server binary for survive-base

use anyhow::Result;
use survive_base::api::ApiServer;
use survive_base::config::AppConfig;
use survive_base::logging::init_tracing;
use survive_base::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();
    init_tracing("info,actix_web=info,reqwest=warn")?;

    tracing::info!("Initializing survive-base API server");
    AppConfig::log_snapshot("api_server")?;

    let server = ApiServer::from_env()?;
    server.run().await?;

    Ok(())
}
