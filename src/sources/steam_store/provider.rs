use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{DetailSource, StoreGame};
use crate::model::{AppId, Categories, Price};
use crate::sources::{truncate_for_log, with_retry, RetryPolicy, SourceError};

const PROVIDER: &str = "steam-store";
const MAX_SCREENSHOTS: usize = 5;

/// Store category ids. These mirror the store's current numbering and must be
/// rechecked if play-mode flags start looking wrong.
pub mod category_ids {
    pub const MULTIPLAYER: i64 = 1;
    pub const SINGLEPLAYER: i64 = 2;
    pub const COOP: i64 = 9;
    pub const ONLINE_COOP: i64 = 38;
    pub const LAN_COOP: i64 = 48;
}

/// Steam store `appdetails` client.
#[derive(Debug, Clone)]
pub struct SteamStoreProvider {
    base_url: String,
    country: String,
    language: String,
    http: Client,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct AppDetailsWrapper {
    #[serde(default)]
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    steam_appid: Option<u32>,
    #[serde(default)]
    is_free: bool,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    header_image: String,
    #[serde(default)]
    screenshots: Vec<Screenshot>,
    price_overview: Option<PriceOverview>,
    release_date: Option<ReleaseDate>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Screenshot {
    #[serde(default)]
    path_full: String,
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(default)]
    initial: i64,
    #[serde(rename = "final", default)]
    final_price: i64,
    #[serde(default)]
    discount_percent: i64,
}

#[derive(Debug, Deserialize)]
struct ReleaseDate {
    #[serde(default)]
    coming_soon: bool,
    #[serde(default)]
    date: String,
}

#[derive(Debug, Deserialize)]
struct Genre {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Category {
    id: i64,
}

impl SteamStoreProvider {
    pub fn new(
        base_url: &str,
        country: &str,
        language: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("survive-base/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
            language: language.to_string(),
            http,
            retry,
        })
    }

    async fn request_detail(&self, app_id: AppId) -> Result<Value, SourceError> {
        let url = format!("{}/appdetails", self.base_url);
        let appids = app_id.to_string();
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("appids", appids.as_str()),
                ("cc", self.country.as_str()),
                ("l", self.language.as_str()),
            ])
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
            debug!(app_id, status = status.as_u16(), body = %body, "steam store: non-success response");
            return Err(SourceError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                url,
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
impl DetailSource for SteamStoreProvider {
    async fn fetch_detail(&self, app_id: AppId) -> Result<Option<StoreGame>, SourceError> {
        let label = format!("steam store appid={app_id}");
        let body = with_retry(&self.retry, &label, || self.request_detail(app_id)).await?;
        parse_app_details(app_id, &body)
    }
}

/// Normalizes an `appdetails` body for `app_id`.
///
/// Returns `Ok(None)` when the store flags the lookup as unsuccessful or the
/// entry is not a game.
pub fn parse_app_details(app_id: AppId, body: &Value) -> Result<Option<StoreGame>, SourceError> {
    let Some(entry) = body.get(app_id.to_string()) else {
        return Err(SourceError::Malformed {
            provider: PROVIDER,
            reason: format!("response has no entry for app {app_id}"),
        });
    };
    let wrapper: AppDetailsWrapper =
        serde_json::from_value(entry.clone()).map_err(|e| SourceError::Malformed {
            provider: PROVIDER,
            reason: format!("app {app_id}: {e}"),
        })?;

    let data = match (wrapper.success, wrapper.data) {
        (true, Some(data)) => data,
        _ => return Ok(None),
    };
    if data.kind != "game" {
        debug!(app_id, kind = %data.kind, "steam store: not a game");
        return Ok(None);
    }

    let present: HashSet<i64> = data.categories.iter().map(|c| c.id).collect();
    let categories = Categories {
        singleplayer: present.contains(&category_ids::SINGLEPLAYER),
        multiplayer: present.contains(&category_ids::MULTIPLAYER),
        coop: [
            category_ids::COOP,
            category_ids::ONLINE_COOP,
            category_ids::LAN_COOP,
        ]
        .iter()
        .any(|id| present.contains(id)),
    };

    let price = match data.price_overview {
        Some(p) => Price::new(p.initial, p.final_price, p.discount_percent, data.is_free),
        None => Price::new(0, 0, 0, data.is_free),
    };

    let release_date = match data.release_date {
        Some(rd) if !rd.coming_soon => rd.date.trim().to_string(),
        _ => String::new(),
    };

    let screenshots = data
        .screenshots
        .into_iter()
        .map(|s| s.path_full)
        .filter(|p| !p.trim().is_empty())
        .take(MAX_SCREENSHOTS)
        .collect();

    let genres = data
        .genres
        .into_iter()
        .map(|g| g.description.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();

    Ok(Some(StoreGame {
        app_id: data.steam_appid.unwrap_or(app_id),
        name: data.name,
        description: data.short_description,
        header_image: data.header_image,
        screenshots,
        price,
        release_date,
        genres,
        categories,
    }))
}
