//! Unified catalog entity produced by the merge engine and persisted by the cache store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalization::rating::review_score;

/// Steam application id; the join key across both sources.
pub type AppId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub appid: AppId,
    pub name: String,
    pub description: String,
    pub header_image: String,
    pub screenshots: Vec<String>,
    pub price: Price,
    pub reviews: Reviews,
    pub release_date: String,
    /// Display tags, first-seen casing, unique by `tag_key`.
    pub tags: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub categories: Categories,
    /// Ownership range label as reported by SteamSpy, e.g. "1,000,000 .. 2,000,000".
    pub owners: String,
    /// Average playtime in minutes.
    pub playtime: u32,
    pub updated_at: DateTime<Utc>,
}

/// Price block in the store's minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PriceRepr")]
pub struct Price {
    pub initial: i64,
    #[serde(rename = "final")]
    pub final_price: i64,
    pub discount_percent: u8,
    pub is_free: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRepr {
    #[serde(default)]
    initial: i64,
    #[serde(default, rename = "final")]
    final_price: i64,
    #[serde(default)]
    discount_percent: i64,
    #[serde(default)]
    is_free: bool,
}

impl From<PriceRepr> for Price {
    fn from(r: PriceRepr) -> Self {
        Price::new(r.initial, r.final_price, r.discount_percent, r.is_free)
    }
}

impl Price {
    /// Builds a normalized price: discount clamped to 0..=100, negative amounts
    /// floored at zero and a free title always at a final price of zero.
    pub fn new(initial: i64, final_price: i64, discount_percent: i64, is_free: bool) -> Self {
        Self {
            initial: initial.max(0),
            final_price: if is_free { 0 } else { final_price.max(0) },
            discount_percent: discount_percent.clamp(0, 100) as u8,
            is_free,
        }
    }

    pub fn free() -> Self {
        Self::new(0, 0, 0, true)
    }

    /// Final price in major units (the store reports hundredths).
    pub fn final_major(&self) -> i64 {
        self.final_price / 100
    }
}

/// Review counts with a score that is always derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ReviewsRepr")]
pub struct Reviews {
    positive: u64,
    negative: u64,
    score: u8,
}

#[derive(Deserialize)]
struct ReviewsRepr {
    #[serde(default)]
    positive: u64,
    #[serde(default)]
    negative: u64,
}

impl From<ReviewsRepr> for Reviews {
    fn from(r: ReviewsRepr) -> Self {
        Reviews::new(r.positive, r.negative)
    }
}

impl Reviews {
    pub fn new(positive: u64, negative: u64) -> Self {
        Self {
            positive,
            negative,
            score: review_score(positive, negative),
        }
    }

    pub fn positive(&self) -> u64 {
        self.positive
    }

    pub fn negative(&self) -> u64 {
        self.negative
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn total(&self) -> u64 {
        self.positive.saturating_add(self.negative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Categories {
    #[serde(default)]
    pub singleplayer: bool,
    #[serde(default)]
    pub multiplayer: bool,
    #[serde(default)]
    pub coop: bool,
}
