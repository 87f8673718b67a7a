//! External game-data sources and the plumbing shared by their batch fetchers.
//!
//! Both sources are polled strictly one request at a time with a fixed pause
//! between requests; batch fetches never abort on a single failed item and
//! instead report every item's outcome in a [`BatchReport`].

pub mod retry;
pub mod steam_store;
pub mod steamspy;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::AppId;
pub use retry::{with_retry, Retryable, RetryPolicy};
pub use steam_store::{DetailSource, StoreGame};
pub use steamspy::{SpyGame, TagSource};

/// A single call to an external source failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{provider} request to {url} failed: {error}")]
    Transport {
        provider: &'static str,
        url: String,
        #[source]
        error: reqwest::Error,
    },
    #[error("{provider} returned HTTP {status} for {url}")]
    Status {
        provider: &'static str,
        status: u16,
        url: String,
    },
    #[error("{provider} returned a malformed body: {reason}")]
    Malformed {
        provider: &'static str,
        reason: String,
    },
}

impl Retryable for SourceError {
    fn is_retryable(&self) -> bool {
        match self {
            SourceError::Transport { .. } => true,
            SourceError::Status { status, .. } => *status == 429 || *status >= 500,
            SourceError::Malformed { .. } => false,
        }
    }
}

/// Suspension point used between rate-limited requests.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// What happened to one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The call succeeded and yielded this many records.
    Fetched(usize),
    /// The call succeeded but the source had nothing usable for the item.
    Absent,
    /// The call failed; the item was skipped.
    Failed(String),
}

/// Records gathered by a batch plus the per-item outcome, in request order.
#[derive(Debug, Clone)]
pub struct BatchReport<K, V> {
    pub records: HashMap<AppId, V>,
    pub outcomes: Vec<(K, ItemOutcome)>,
}

impl<K, V> Default for BatchReport<K, V> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            outcomes: Vec::new(),
        }
    }
}

impl<K, V> BatchReport<K, V> {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&K, &str)> {
        self.outcomes.iter().filter_map(|(k, o)| match o {
            ItemOutcome::Failed(reason) => Some((k, reason.as_str())),
            _ => None,
        })
    }

    pub fn failed_keys(&self) -> Vec<&K> {
        self.failed().map(|(k, _)| k).collect()
    }

    pub fn absent_keys(&self) -> Vec<&K> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ItemOutcome::Absent))
            .map(|(k, _)| k)
            .collect()
    }
}

/// Shrinks an error body to something that fits on a log line.
pub(crate) fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}
