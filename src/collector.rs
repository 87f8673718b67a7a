//! One full collection run: tag listings, store details, merge, cache write.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::merge::merge;
use crate::model::AppId;
use crate::sources::steam_store::fetch_many;
use crate::sources::steamspy::fetch_for_tags;
use crate::sources::{DetailSource, Pacer, TagSource};
use crate::store::{CacheError, CacheStore};

/// Inputs of a run that do not come from the sources themselves.
#[derive(Debug, Clone)]
pub struct CollectPlan {
    pub tags: Vec<String>,
    /// Caps the number of ids sent to the store, lowest ids first.
    pub max_games: Option<usize>,
    pub spy_delay: Duration,
    pub store_delay: Duration,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("collection produced no records; cache left untouched")]
    Empty,
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub run_id: Uuid,
    pub tags_requested: usize,
    pub failed_tags: Vec<String>,
    pub spy_games: usize,
    pub details_requested: usize,
    pub store_details: usize,
    pub failed_ids: Vec<AppId>,
    pub absent_ids: Vec<AppId>,
    pub records_written: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub async fn collect(
    plan: &CollectPlan,
    spy: &dyn TagSource,
    store: &dyn DetailSource,
    pacer: &dyn Pacer,
    cache: &CacheStore,
) -> Result<CollectionSummary, CollectError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, tags = ?plan.tags, "collection: starting");

    let spy_report = fetch_for_tags(spy, &plan.tags, plan.spy_delay, pacer).await;
    info!(
        %run_id,
        games = spy_report.records.len(),
        failed = spy_report.failed_keys().len(),
        "collection: tag listings fetched"
    );

    let mut ids: Vec<AppId> = spy_report.records.keys().copied().collect();
    ids.sort_unstable();
    if let Some(max) = plan.max_games {
        if ids.len() > max {
            info!(%run_id, total = ids.len(), max, "collection: capping detail fetches");
            ids.truncate(max);
        }
    }

    let progress = |done: usize, total: usize| {
        if done % 10 == 0 || done == total {
            info!(%run_id, done, total, "collection: store details progress");
        }
    };
    let store_report = fetch_many(store, &ids, plan.store_delay, pacer, Some(&progress)).await;

    let records = merge(&spy_report.records, &store_report.records, Utc::now());
    if records.is_empty() {
        warn!(%run_id, "collection: nothing to write");
        return Err(CollectError::Empty);
    }
    let snapshot = cache.write(&records).await?;

    let summary = CollectionSummary {
        run_id,
        tags_requested: plan.tags.len(),
        failed_tags: spy_report.failed_keys().into_iter().cloned().collect(),
        spy_games: spy_report.records.len(),
        details_requested: ids.len(),
        store_details: store_report.records.len(),
        failed_ids: store_report.failed_keys().into_iter().copied().collect(),
        absent_ids: store_report.absent_keys().into_iter().copied().collect(),
        records_written: snapshot.records.len(),
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        %run_id,
        records = summary.records_written,
        failed_tags = summary.failed_tags.len(),
        failed_ids = summary.failed_ids.len(),
        "collection: finished"
    );
    Ok(summary)
}
