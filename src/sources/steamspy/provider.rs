use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{SpyGame, TagSource};
use crate::sources::{truncate_for_log, with_retry, RetryPolicy, SourceError};

const PROVIDER: &str = "steamspy";

/// SteamSpy client for the `request=tag` endpoint.
///
/// The tag endpoint answers with an object keyed by app id; each entry carries
/// review counts, the ownership range and playtime averages.
#[derive(Debug, Clone)]
pub struct SteamSpyProvider {
    base_url: String,
    http: Client,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct RawSpyGame {
    appid: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    positive: u64,
    #[serde(default)]
    negative: u64,
    #[serde(default)]
    owners: String,
    #[serde(default)]
    average_forever: u32,
    /// `{ "Survival": 1234, ... }` when present, `[]` when the title has none.
    #[serde(default)]
    tags: Value,
}

impl SteamSpyProvider {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("survive-base/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            retry,
        })
    }

    async fn request_tag(&self, tag: &str) -> Result<Value, SourceError> {
        let url = &self.base_url;
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(&[("request", "tag"), ("tag", tag)])
            .send()
            .await
            .map_err(|error| SourceError::Transport {
                provider: PROVIDER,
                url: url.clone(),
                error,
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 500);
            debug!(tag, status = status.as_u16(), body = %body, "steamspy: non-success response");
            return Err(SourceError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                url: url.clone(),
            });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| SourceError::Malformed {
                provider: PROVIDER,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl TagSource for SteamSpyProvider {
    async fn fetch_by_tag(&self, tag: &str) -> Result<Vec<SpyGame>, SourceError> {
        let label = format!("steamspy tag={tag}");
        let body = with_retry(&self.retry, &label, || self.request_tag(tag)).await?;
        parse_tag_response(&body)
    }
}

/// Normalizes a tag-endpoint body into records, ordered by app id.
pub fn parse_tag_response(body: &Value) -> Result<Vec<SpyGame>, SourceError> {
    let entries = body.as_object().ok_or_else(|| SourceError::Malformed {
        provider: PROVIDER,
        reason: "expected an object keyed by app id".into(),
    })?;

    let mut games = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        let raw: RawSpyGame = match serde_json::from_value(entry.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(entry = %key, error = %e, "steamspy: skipping malformed entry");
                continue;
            }
        };
        if raw.appid == 0 {
            continue;
        }
        games.push(SpyGame {
            app_id: raw.appid,
            name: raw.name,
            positive: raw.positive,
            negative: raw.negative,
            owners: raw.owners,
            average_playtime: raw.average_forever,
            tags: tag_names(&raw.tags),
        });
    }
    games.sort_by_key(|g| g.app_id);
    Ok(games)
}

/// Tag names ordered by vote count, highest first.
fn tag_names(tags: &Value) -> Vec<String> {
    match tags {
        Value::Object(map) => {
            let mut pairs: Vec<(&String, u64)> = map
                .iter()
                .map(|(name, votes)| (name, votes.as_u64().unwrap_or(0)))
                .collect();
            pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            pairs.into_iter().map(|(name, _)| name.clone()).collect()
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
