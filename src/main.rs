use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use survive_base::collector::collect;
use survive_base::config::AppConfig;
use survive_base::logging::init_tracing;
use survive_base::merge::merge_one;
use survive_base::model::AppId;
use survive_base::normalization::rating::review_label;
use survive_base::similarity::{rank_similar, similarity_label, DEFAULT_LIMIT};
use survive_base::sources::{DetailSource, TokioPacer};
use survive_base::util::env;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "survive-base", version, about = "Survival games catalog admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch both sources, merge and rewrite the cache
    Collect {
        /// Comma-separated tag list (defaults to COLLECT_TAGS)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Cap on store detail fetches (defaults to COLLECT_MAX_GAMES)
        #[arg(long)]
        max_games: Option<usize>,
        /// Collect even when the cache is still fresh
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print cache presence, size, age and staleness
    Info,
    /// Rank the games most similar to one app id
    Similar {
        appid: AppId,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Fetch one title straight from the store and print it as a record
    Detail { appid: AppId },
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing("info,reqwest=warn")?;

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Commands::Collect {
            tags,
            max_games,
            force,
        } => {
            AppConfig::log_snapshot("collect")?;
            if let Some(tags) = tags.filter(|t| !t.is_empty()) {
                config.tags = tags;
            }
            if max_games.is_some() {
                config.max_games = max_games;
            }
            config.validate()?;

            let cache = config.cache_store();
            if !force && !cache.is_stale().await {
                info!(path = %cache.path().display(), "collect: cache is fresh; skipping (use --force)");
                return Ok(());
            }

            let spy = config.steamspy()?;
            let store = config.steam_store()?;
            let summary = collect(&config.collect_plan(), &spy, &store, &TokioPacer, &cache)
                .await
                .context("collection failed")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Info => {
            let cache = config.cache_store();
            let info = cache.info().await;
            let stale = cache.is_stale().await;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "path": cache.path().display().to_string(),
                    "version": cache.version(),
                    "exists": info.exists,
                    "recordCount": info.record_count,
                    "updatedAt": info.updated_at,
                    "stale": stale,
                }))?
            );
        }
        Commands::Similar { appid, limit } => {
            let records = config.cache_store().get_all().await;
            let Some(target) = records.iter().find(|r| r.appid == appid) else {
                bail!("app {appid} is not in the catalog");
            };
            println!("{} ({})", target.name, target.appid);
            for scored in rank_similar(target, &records, limit) {
                println!(
                    "  {:>5.1}%  {:<16}  {:>8}  {}  [{}]",
                    scored.score * 100.0,
                    similarity_label(scored.score),
                    scored.record.appid,
                    scored.record.name,
                    review_label(scored.record.reviews.score()),
                );
            }
        }
        Commands::Detail { appid } => {
            let store = config.steam_store()?;
            let game = store
                .fetch_detail(appid)
                .await
                .with_context(|| format!("fetching store details for {appid}"))?;
            let Some(game) = game else {
                bail!("store has no game data for app {appid}");
            };
            let record = merge_one(appid, None, Some(&game), Utc::now())
                .context("building record from store details")?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
