// API request/response models (DTOs)

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogQuery, PlayMode, PriceRange, SortOption};
use crate::collector::CollectionSummary;
use crate::model::{AppId, GameRecord};
use crate::store::CacheInfo;
use crate::util::env::split_list;

/// Error body shared by every failing read endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("game {0} not found")]
    NotFound(AppId),
    #[error("{0}")]
    BadRequest(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: CacheInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusResponse {
    #[serde(flatten)]
    pub info: CacheInfo,
    pub stale: bool,
    pub version: u32,
}

/// Raw `/api/games` query string. List-valued filters are comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct GamesQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub tags: Option<String>,
    pub price: Option<String>,
    pub modes: Option<String>,
}

impl GamesQuery {
    pub fn into_catalog_query(self) -> Result<CatalogQuery, ApiError> {
        let sort = self
            .sort
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<SortOption>)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let price = self
            .price
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<PriceRange>)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let play_modes = split_list(self.modes.as_deref().unwrap_or_default())
            .iter()
            .map(|m| m.parse::<PlayMode>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::BadRequest)?;

        Ok(CatalogQuery {
            search: self.search,
            sort,
            tags: split_list(self.tags.as_deref().unwrap_or_default()),
            price,
            play_modes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// One entry of the similar-games list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarEntry<'a> {
    #[serde(flatten)]
    pub game: &'a GameRecord,
    pub similarity: f64,
    pub similarity_label: &'static str,
}

/// Cron trigger outcome.
#[derive(Debug, Serialize)]
pub struct CronResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CollectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CronResponse {
    pub fn completed(summary: CollectionSummary) -> Self {
        Self {
            success: true,
            message: "Data collection completed".to_string(),
            timestamp: Utc::now(),
            summary: Some(summary),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            timestamp: Utc::now(),
            summary: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_query_parses_lists_and_options() {
        let q = GamesQuery {
            search: Some("raft".into()),
            sort: Some("newest".into()),
            tags: Some("Survival, Crafting".into()),
            price: Some("under15000".into()),
            modes: Some("coop,singleplayer".into()),
        }
        .into_catalog_query()
        .unwrap();
        assert_eq!(q.sort, Some(SortOption::Newest));
        assert_eq!(q.tags, vec!["Survival", "Crafting"]);
        assert_eq!(q.price, Some(PriceRange::Under15000));
        assert_eq!(q.play_modes, vec![PlayMode::Coop, PlayMode::Singleplayer]);
    }

    #[test]
    fn games_query_rejects_unknown_values() {
        let bad_sort = GamesQuery {
            sort: Some("random".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad_sort.into_catalog_query(),
            Err(ApiError::BadRequest(_))
        ));
        let bad_mode = GamesQuery {
            modes: Some("mmo".into()),
            ..Default::default()
        };
        assert!(bad_mode.into_catalog_query().is_err());
    }

    #[test]
    fn empty_query_is_unfiltered() {
        let q = GamesQuery::default().into_catalog_query().unwrap();
        assert_eq!(q, CatalogQuery::default());
    }

    #[test]
    fn api_error_statuses() {
        assert_eq!(ApiError::NotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
