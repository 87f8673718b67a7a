//! Tag-overlap ranking for the "similar games" list.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::GameRecord;
use crate::normalization::tags::tag_set;

pub const DEFAULT_LIMIT: usize = 6;

/// `|A ∩ B| / |A ∪ B|`; two empty sets score 0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Jaccard similarity of two records' case-folded tag sets.
pub fn similarity(a: &GameRecord, b: &GameRecord) -> f64 {
    jaccard(&tag_set(&a.tags), &tag_set(&b.tags))
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredGame<'a> {
    pub record: &'a GameRecord,
    pub score: f64,
}

/// Every other record with a non-zero similarity to `target`, best first.
/// Equal scores are ordered by review score, highest first.
pub fn rank_similar<'a>(
    target: &GameRecord,
    all: &'a [GameRecord],
    limit: usize,
) -> Vec<ScoredGame<'a>> {
    let target_tags = tag_set(&target.tags);
    let mut scored: Vec<ScoredGame<'a>> = all
        .iter()
        .filter(|candidate| candidate.appid != target.appid)
        .map(|candidate| ScoredGame {
            record: candidate,
            score: jaccard(&target_tags, &tag_set(&candidate.tags)),
        })
        .filter(|s| s.score > 0.0)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.record.reviews.score().cmp(&a.record.reviews.score()))
    });
    scored.truncate(limit);
    scored
}

pub fn find_similar<'a>(
    target: &GameRecord,
    all: &'a [GameRecord],
    limit: usize,
) -> Vec<&'a GameRecord> {
    rank_similar(target, all, limit)
        .into_iter()
        .map(|s| s.record)
        .collect()
}

/// Coarse wording for a 0-1 similarity score.
pub fn similarity_label(score: f64) -> &'static str {
    let percent = (score * 100.0).round();
    if percent >= 80.0 {
        "Very similar"
    } else if percent >= 60.0 {
        "Similar"
    } else if percent >= 40.0 {
        "Related"
    } else {
        "Somewhat related"
    }
}
