// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::api::server::AppState;
use crate::catalog::tag_counts;
use crate::model::{AppId, GameRecord};
use crate::similarity::{rank_similar, similarity_label, DEFAULT_LIMIT};
use actix_web::{web, HttpResponse};

const DEFAULT_TAG_LIMIT: usize = 15;
const MAX_LIMIT: usize = 100;

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: state.cache.info().await,
    })
}

/// Full catalog, optionally filtered and sorted.
pub async fn list_games(
    state: web::Data<AppState>,
    query: web::Query<GamesQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner().into_catalog_query()?;
    let records = state.cache.get_all().await;
    let listed: Vec<&GameRecord> = query.apply(&records);
    tracing::debug!(total = records.len(), listed = listed.len(), "games listed");
    Ok(HttpResponse::Ok().json(listed))
}

pub async fn get_game(
    state: web::Data<AppState>,
    path: web::Path<AppId>,
) -> Result<HttpResponse, ApiError> {
    let app_id = path.into_inner();
    let record = state
        .cache
        .get_by_id(app_id)
        .await
        .ok_or(ApiError::NotFound(app_id))?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn similar_games(
    state: web::Data<AppState>,
    path: web::Path<AppId>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ApiError> {
    let app_id = path.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let records = state.cache.get_all().await;
    let target = records
        .iter()
        .find(|r| r.appid == app_id)
        .ok_or(ApiError::NotFound(app_id))?;

    let entries: Vec<SimilarEntry<'_>> = rank_similar(target, &records, limit)
        .into_iter()
        .map(|s| SimilarEntry {
            game: s.record,
            similarity: s.score,
            similarity_label: similarity_label(s.score),
        })
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

/// Tag frequencies for the tag cloud.
pub async fn list_tags(state: web::Data<AppState>, query: web::Query<LimitQuery>) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_TAG_LIMIT).min(MAX_LIMIT);
    let records = state.cache.get_all().await;
    HttpResponse::Ok().json(tag_counts(&records, limit))
}

pub async fn cache_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(CacheStatusResponse {
        info: state.cache.info().await,
        stale: state.cache.is_stale().await,
        version: state.cache.version(),
    })
}

/// Scheduled trigger: runs the full collection pipeline inline.
pub async fn collect_data(state: web::Data<AppState>) -> HttpResponse {
    tracing::info!(timestamp = %chrono::Utc::now(), "cron: data collection requested");

    match state.run_collection().await {
        Err(_) => HttpResponse::Conflict().json(CronResponse::failed(
            "Data collection already running",
            "another collection is in progress",
        )),
        Ok(Ok(summary)) => HttpResponse::Ok().json(CronResponse::completed(summary)),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "cron: data collection failed");
            HttpResponse::InternalServerError()
                .json(CronResponse::failed("Data collection failed", err.to_string()))
        }
    }
}
