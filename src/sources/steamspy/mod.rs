pub mod provider;

pub use provider::SteamSpyProvider;

use std::collections::hash_map::Entry;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{BatchReport, ItemOutcome, Pacer, SourceError};
use crate::model::AppId;
use crate::normalization::tags::union_tags;

/// One title as reported by the tag-aggregation source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpyGame {
    pub app_id: AppId,
    pub name: String,
    pub positive: u64,
    pub negative: u64,
    pub owners: String,
    /// Average playtime in minutes.
    pub average_playtime: u32,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait TagSource: Send + Sync {
    async fn fetch_by_tag(&self, tag: &str) -> Result<Vec<SpyGame>, SourceError>;
}

/// Fetches every tag in order, one request at a time, pausing `delay` after
/// each completed request.
///
/// Each record carries the tag it was found under. A title seen under several
/// tags keeps its first-seen fields and accumulates the union of tags. A tag
/// whose request fails is logged and skipped.
pub async fn fetch_for_tags(
    source: &dyn TagSource,
    tags: &[String],
    delay: Duration,
    pacer: &dyn Pacer,
) -> BatchReport<String, SpyGame> {
    let mut report: BatchReport<String, SpyGame> = BatchReport::default();

    for tag in tags {
        info!(tag = %tag, "steamspy: fetching games for tag");
        match source.fetch_by_tag(tag).await {
            Ok(games) => {
                let found = games.len();
                for mut game in games {
                    game.tags = union_tags([std::slice::from_ref(tag), game.tags.as_slice()]);
                    match report.records.entry(game.app_id) {
                        Entry::Occupied(mut slot) => {
                            let existing = slot.get_mut();
                            existing.tags =
                                union_tags([existing.tags.as_slice(), game.tags.as_slice()]);
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(game);
                        }
                    }
                }
                info!(
                    tag = %tag,
                    found,
                    unique = report.records.len(),
                    "steamspy: tag fetched"
                );
                report.outcomes.push((tag.clone(), ItemOutcome::Fetched(found)));
            }
            Err(err) => {
                warn!(tag = %tag, error = %err, "steamspy: tag fetch failed; skipping");
                report
                    .outcomes
                    .push((tag.clone(), ItemOutcome::Failed(err.to_string())));
            }
        }
        pacer.pause(delay).await;
    }

    report
}
