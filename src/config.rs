//! Typed configuration resolved from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::collector::CollectPlan;
use crate::sources::steam_store::SteamStoreProvider;
use crate::sources::steamspy::SteamSpyProvider;
use crate::sources::RetryPolicy;
use crate::store::{CacheStore, Fallback, CURRENT_VERSION};
use crate::util::env::{env_list, env_opt, env_parse, env_parse_opt, preflight_check};

pub const DEFAULT_TAGS: [&str; 4] = [
    "Survival",
    "Open World Survival Craft",
    "Crafting",
    "Base Building",
];

/// Keys included in the startup configuration snapshot.
pub const LOGGED_KEYS: [&str; 19] = [
    "STEAMSPY_BASE_URL",
    "STEAMSPY_DELAY_MS",
    "STEAM_STORE_BASE_URL",
    "STEAM_STORE_DELAY_MS",
    "STEAM_STORE_COUNTRY",
    "STEAM_STORE_LANGUAGE",
    "HTTP_TIMEOUT_SECS",
    "RETRY_MAX_ATTEMPTS",
    "RETRY_BASE_MS",
    "RETRY_MAX_MS",
    "COLLECT_TAGS",
    "COLLECT_MAX_GAMES",
    "CACHE_PATH",
    "FALLBACK_PATH",
    "CACHE_VERSION",
    "CACHE_STALE_HOURS",
    "CRON_SECRET",
    "API_HOST",
    "API_PORT",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub steamspy_base_url: String,
    pub steamspy_delay: Duration,
    pub store_base_url: String,
    pub store_delay: Duration,
    pub store_country: String,
    pub store_language: String,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            steamspy_base_url: "https://steamspy.com/api.php".into(),
            steamspy_delay: Duration::from_millis(1000),
            store_base_url: "https://store.steampowered.com/api".into(),
            store_delay: Duration::from_millis(1500),
            store_country: "kr".into(),
            store_language: "korean".into(),
            http_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub path: PathBuf,
    /// `None` serves the bundled dataset.
    pub fallback_path: Option<PathBuf>,
    pub version: u32,
    pub stale_after: chrono::Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/games.json"),
            fallback_path: None,
            version: CURRENT_VERSION,
            stale_after: chrono::Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub sources: SourceConfig,
    pub cache: CacheConfig,
    pub tags: Vec<String>,
    pub max_games: Option<usize>,
    pub cron_secret: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            cache: CacheConfig::default(),
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            max_games: None,
            cron_secret: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let retry_defaults = RetryPolicy::default();

        let sources = SourceConfig {
            steamspy_base_url: env_opt("STEAMSPY_BASE_URL")
                .unwrap_or(defaults.sources.steamspy_base_url),
            steamspy_delay: Duration::from_millis(env_parse("STEAMSPY_DELAY_MS", 1000u64)),
            store_base_url: env_opt("STEAM_STORE_BASE_URL")
                .unwrap_or(defaults.sources.store_base_url),
            store_delay: Duration::from_millis(env_parse("STEAM_STORE_DELAY_MS", 1500u64)),
            store_country: env_opt("STEAM_STORE_COUNTRY").unwrap_or(defaults.sources.store_country),
            store_language: env_opt("STEAM_STORE_LANGUAGE")
                .unwrap_or(defaults.sources.store_language),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 15u64)),
            retry: RetryPolicy {
                max_retries: env_parse("RETRY_MAX_ATTEMPTS", retry_defaults.max_retries),
                base_delay: Duration::from_millis(env_parse("RETRY_BASE_MS", 1000u64)),
                max_delay: Duration::from_millis(env_parse("RETRY_MAX_MS", 10_000u64)),
            },
        };

        let cache = CacheConfig {
            path: env_opt("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache.path),
            fallback_path: env_opt("FALLBACK_PATH").map(PathBuf::from),
            version: env_parse("CACHE_VERSION", CURRENT_VERSION),
            stale_after: chrono::Duration::hours(env_parse("CACHE_STALE_HOURS", 24i64)),
        };

        let config = Self {
            sources,
            cache,
            tags: env_list("COLLECT_TAGS").unwrap_or(defaults.tags),
            max_games: env_parse_opt("COLLECT_MAX_GAMES"),
            cron_secret: env_opt("CRON_SECRET").map(|s| s.trim().to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Logs a redacted snapshot of the resolved environment.
    pub fn log_snapshot(title: &str) -> Result<()> {
        preflight_check(title, &[], &LOGGED_KEYS)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, raw) in [
            ("STEAMSPY_BASE_URL", &self.sources.steamspy_base_url),
            ("STEAM_STORE_BASE_URL", &self.sources.store_base_url),
        ] {
            let parsed = Url::parse(raw).with_context(|| format!("{key} is not a valid URL"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("{key} must be an http(s) URL, got {raw}");
            }
        }
        if self.tags.is_empty() {
            bail!("COLLECT_TAGS must name at least one tag");
        }
        if self.cache.stale_after < chrono::Duration::zero() {
            bail!("CACHE_STALE_HOURS must not be negative");
        }
        Ok(())
    }

    pub fn cache_store(&self) -> CacheStore {
        let fallback = match &self.cache.fallback_path {
            Some(path) => Fallback::File(path.clone()),
            None => Fallback::Bundled,
        };
        CacheStore::new(self.cache.path.clone())
            .with_version(self.cache.version)
            .with_stale_after(self.cache.stale_after)
            .with_fallback(fallback)
    }

    pub fn steamspy(&self) -> Result<SteamSpyProvider> {
        SteamSpyProvider::new(
            &self.sources.steamspy_base_url,
            self.sources.http_timeout,
            self.sources.retry,
        )
        .context("building SteamSpy client")
    }

    pub fn steam_store(&self) -> Result<SteamStoreProvider> {
        SteamStoreProvider::new(
            &self.sources.store_base_url,
            &self.sources.store_country,
            &self.sources.store_language,
            self.sources.http_timeout,
            self.sources.retry,
        )
        .context("building Steam store client")
    }

    pub fn collect_plan(&self) -> CollectPlan {
        CollectPlan {
            tags: self.tags.clone(),
            max_games: self.max_games,
            spy_delay: self.sources.steamspy_delay,
            store_delay: self.sources.store_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tags.len(), 4);
        assert_eq!(config.sources.steamspy_delay, Duration::from_millis(1000));
        assert_eq!(config.cache.version, CURRENT_VERSION);
    }

    #[test]
    fn rejects_bad_base_urls() {
        let mut config = AppConfig::default();
        config.sources.store_base_url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.sources.steamspy_base_url = "ftp://steamspy.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_tag_list() {
        let config = AppConfig {
            tags: vec![],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builds_cache_store_and_plan() {
        let mut config = AppConfig::default();
        config.cache.path = PathBuf::from("/tmp/x/games.json");
        config.cache.version = 3;
        config.max_games = Some(10);

        let store = config.cache_store();
        assert_eq!(store.path(), PathBuf::from("/tmp/x/games.json").as_path());
        assert_eq!(store.version(), 3);

        let plan = config.collect_plan();
        assert_eq!(plan.max_games, Some(10));
        assert_eq!(plan.store_delay, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn builds_providers() {
        let config = AppConfig::default();
        assert!(config.steamspy().is_ok());
        assert!(config.steam_store().is_ok());
    }
}
