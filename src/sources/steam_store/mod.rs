pub mod provider;

pub use provider::SteamStoreProvider;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{BatchReport, ItemOutcome, Pacer, SourceError};
use crate::model::{AppId, Categories, Price};

/// Rich store details for one playable title.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreGame {
    pub app_id: AppId,
    pub name: String,
    pub description: String,
    pub header_image: String,
    pub screenshots: Vec<String>,
    pub price: Price,
    pub release_date: String,
    pub genres: Vec<String>,
    pub categories: Categories,
}

#[async_trait]
pub trait DetailSource: Send + Sync {
    /// `Ok(None)` when the store reports no data for the id or the entry is
    /// not a game (DLC, soundtrack, video).
    async fn fetch_detail(&self, app_id: AppId) -> Result<Option<StoreGame>, SourceError>;
}

/// Progress hook receiving `(completed, total)` after every id.
pub type Progress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Fetches details for `ids` sequentially, pausing `delay` between requests.
///
/// Failed ids are logged and left out of `records`; the batch always visits
/// every id.
pub async fn fetch_many(
    source: &dyn DetailSource,
    ids: &[AppId],
    delay: Duration,
    pacer: &dyn Pacer,
    on_progress: Option<Progress<'_>>,
) -> BatchReport<AppId, StoreGame> {
    let mut report: BatchReport<AppId, StoreGame> = BatchReport::default();
    let total = ids.len();

    for (idx, &app_id) in ids.iter().enumerate() {
        let outcome = match source.fetch_detail(app_id).await {
            Ok(Some(game)) => {
                report.records.insert(app_id, game);
                ItemOutcome::Fetched(1)
            }
            Ok(None) => {
                debug!(app_id, "steam store: no playable game data; skipping");
                ItemOutcome::Absent
            }
            Err(err) => {
                warn!(app_id, error = %err, "steam store: detail fetch failed; skipping");
                ItemOutcome::Failed(err.to_string())
            }
        };
        report.outcomes.push((app_id, outcome));

        if let Some(cb) = on_progress {
            cb(idx + 1, total);
        }
        if idx + 1 < total {
            pacer.pause(delay).await;
        }
    }

    report
}
