//! Listing queries over the loaded catalog: search, filters, sorting and tag counts.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::GameRecord;
use crate::normalization::tags::{tag_key, tag_set};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Most reviews first.
    #[default]
    Popular,
    /// Highest review score first, then most reviews.
    Rating,
    /// Latest release first; undated titles last.
    Newest,
    /// Longest average playtime first.
    Trending,
}

/// Price buckets, in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "under15000")]
    Under15000,
    #[serde(rename = "under30000")]
    Under30000,
    #[serde(rename = "over30000")]
    Over30000,
}

impl PriceRange {
    pub fn contains(self, record: &GameRecord) -> bool {
        let price = record.price;
        let is_free = price.is_free || price.final_price == 0;
        let major = price.final_major();
        match self {
            PriceRange::Free => is_free,
            PriceRange::Under15000 => !is_free && major < 15_000,
            PriceRange::Under30000 => !is_free && major < 30_000,
            PriceRange::Over30000 => major >= 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    Singleplayer,
    Multiplayer,
    Coop,
}

impl PlayMode {
    pub fn matches(self, record: &GameRecord) -> bool {
        match self {
            PlayMode::Singleplayer => record.categories.singleplayer,
            PlayMode::Multiplayer => record.categories.multiplayer,
            PlayMode::Coop => record.categories.coop,
        }
    }
}

impl FromStr for SortOption {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popular" => Ok(SortOption::Popular),
            "rating" => Ok(SortOption::Rating),
            "newest" => Ok(SortOption::Newest),
            "trending" => Ok(SortOption::Trending),
            other => Err(format!("unknown sort option {other:?}")),
        }
    }
}

impl FromStr for PriceRange {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PriceRange::Free),
            "under15000" => Ok(PriceRange::Under15000),
            "under30000" => Ok(PriceRange::Under30000),
            "over30000" => Ok(PriceRange::Over30000),
            other => Err(format!("unknown price range {other:?}")),
        }
    }
}

impl FromStr for PlayMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleplayer" => Ok(PlayMode::Singleplayer),
            "multiplayer" => Ok(PlayMode::Multiplayer),
            "coop" | "co-op" => Ok(PlayMode::Coop),
            other => Err(format!("unknown play mode {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    /// `None` keeps the stored order.
    pub sort: Option<SortOption>,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    pub price: Option<PriceRange>,
    /// Any listed mode is enough.
    pub play_modes: Vec<PlayMode>,
}

impl CatalogQuery {
    pub fn matches(&self, record: &GameRecord) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let in_name = record.name.to_lowercase().contains(&needle);
            let in_tags = record.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !in_name && !in_tags {
                return false;
            }
        }
        if !self.tags.is_empty() {
            let have = tag_set(&record.tags);
            if !self.tags.iter().all(|t| have.contains(&tag_key(t))) {
                return false;
            }
        }
        if let Some(range) = self.price {
            if !range.contains(record) {
                return false;
            }
        }
        if !self.play_modes.is_empty() && !self.play_modes.iter().any(|m| m.matches(record)) {
            return false;
        }
        true
    }

    /// Filters then sorts `records`. Sorting is stable.
    pub fn apply<'a>(&self, records: &'a [GameRecord]) -> Vec<&'a GameRecord> {
        let mut out: Vec<&GameRecord> = records.iter().filter(|r| self.matches(r)).collect();
        if let Some(sort) = self.sort {
            sort_records(&mut out, sort);
        }
        out
    }
}

pub fn sort_records(records: &mut [&GameRecord], sort: SortOption) {
    match sort {
        SortOption::Popular => records.sort_by_key(|r| Reverse(r.reviews.total())),
        SortOption::Rating => {
            records.sort_by_key(|r| (Reverse(r.reviews.score()), Reverse(r.reviews.total())))
        }
        SortOption::Newest => records.sort_by_key(|r| Reverse(parse_release_date(&r.release_date))),
        SortOption::Trending => records.sort_by_key(|r| Reverse(r.playtime)),
    }
}

/// Best-effort parse of the store's free-form release date strings.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 6] = [
        "%b %d, %Y",
        "%d %b, %Y",
        "%B %d, %Y",
        "%Y-%m-%d",
        "%Y년 %m월 %d일",
        "%Y. %m. %d.",
    ];
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Tag frequencies across `records`, most frequent first, ties by name.
/// Tags are grouped case-insensitively under their first-seen spelling.
pub fn tag_counts(records: &[GameRecord], limit: usize) -> Vec<TagCount> {
    let mut counts: HashMap<String, TagCount> = HashMap::new();
    for record in records {
        for tag in &record.tags {
            counts
                .entry(tag_key(tag))
                .or_insert_with(|| TagCount {
                    name: tag.clone(),
                    count: 0,
                })
                .count += 1;
        }
    }
    let mut out: Vec<TagCount> = counts.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppId, Categories, Price, Reviews};
    use chrono::Utc;

    fn game(appid: AppId, name: &str) -> GameRecord {
        GameRecord {
            appid,
            name: name.into(),
            description: String::new(),
            header_image: String::new(),
            screenshots: vec![],
            price: Price::new(2_000_000, 2_000_000, 0, false),
            reviews: Reviews::new(10, 0),
            release_date: String::new(),
            tags: vec![],
            genres: vec![],
            categories: Categories::default(),
            owners: String::new(),
            playtime: 0,
            updated_at: Utc::now(),
        }
    }

    fn ids(records: &[&GameRecord]) -> Vec<AppId> {
        records.iter().map(|r| r.appid).collect()
    }

    #[test]
    fn search_matches_name_or_tag() {
        let mut a = game(1, "Valheim");
        a.tags = vec!["Survival".into()];
        let b = game(2, "Raft");
        let all = vec![a, b];

        let q = CatalogQuery {
            search: Some("VAL".into()),
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&all)), vec![1]);

        let q = CatalogQuery {
            search: Some("surv".into()),
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&all)), vec![1]);
    }

    #[test]
    fn tag_filter_requires_all_tags() {
        let mut a = game(1, "A");
        a.tags = vec!["Survival".into(), "Co-op".into()];
        let mut b = game(2, "B");
        b.tags = vec!["Survival".into()];
        let all = vec![a, b];
        let q = CatalogQuery {
            tags: vec!["survival".into(), "CO-OP".into()],
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&all)), vec![1]);
    }

    #[test]
    fn price_buckets_use_major_units() {
        let mut free = game(1, "Free");
        free.price = Price::free();
        let mut cheap = game(2, "Cheap");
        cheap.price = Price::new(1_000_000, 1_000_000, 0, false);
        let mut mid = game(3, "Mid");
        mid.price = Price::new(2_500_000, 2_500_000, 0, false);
        let mut pricey = game(4, "Pricey");
        pricey.price = Price::new(4_000_000, 4_000_000, 0, false);
        let all = vec![free, cheap, mid, pricey];

        let by = |range| {
            ids(&CatalogQuery {
                price: Some(range),
                ..Default::default()
            }
            .apply(&all))
        };
        assert_eq!(by(PriceRange::Free), vec![1]);
        assert_eq!(by(PriceRange::Under15000), vec![2]);
        assert_eq!(by(PriceRange::Under30000), vec![2, 3]);
        assert_eq!(by(PriceRange::Over30000), vec![4]);
    }

    #[test]
    fn play_mode_filter_matches_any() {
        let mut solo = game(1, "Solo");
        solo.categories.singleplayer = true;
        let mut coop = game(2, "Coop");
        coop.categories.coop = true;
        let none = game(3, "None");
        let all = vec![solo, coop, none];
        let q = CatalogQuery {
            play_modes: vec![PlayMode::Singleplayer, PlayMode::Coop],
            ..Default::default()
        };
        assert_eq!(ids(&q.apply(&all)), vec![1, 2]);
    }

    #[test]
    fn sorts() {
        let mut a = game(1, "A");
        a.reviews = Reviews::new(50, 50);
        a.release_date = "Dec 10, 2020".into();
        a.playtime = 10;
        let mut b = game(2, "B");
        b.reviews = Reviews::new(9, 1);
        b.release_date = "2023-05-01".into();
        b.playtime = 5;
        let mut c = game(3, "C");
        c.reviews = Reviews::new(900, 100);
        c.release_date = "Coming soon".into();
        c.playtime = 99;
        let all = vec![a, b, c];

        let sorted = |sort| {
            ids(&CatalogQuery {
                sort: Some(sort),
                ..Default::default()
            }
            .apply(&all))
        };
        assert_eq!(sorted(SortOption::Popular), vec![3, 1, 2]);
        assert_eq!(sorted(SortOption::Rating), vec![3, 2, 1]);
        assert_eq!(sorted(SortOption::Newest), vec![2, 1, 3]);
        assert_eq!(sorted(SortOption::Trending), vec![3, 1, 2]);
    }

    #[test]
    fn release_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 2, 2);
        assert_eq!(parse_release_date("Feb 2, 2021"), expected);
        assert_eq!(parse_release_date("2 Feb, 2021"), expected);
        assert_eq!(parse_release_date("2021-02-02"), expected);
        assert_eq!(parse_release_date(""), None);
        assert_eq!(parse_release_date("To be announced"), None);
    }

    #[test]
    fn tag_counts_group_case_insensitively() {
        let mut a = game(1, "A");
        a.tags = vec!["Survival".into(), "Crafting".into()];
        let mut b = game(2, "B");
        b.tags = vec!["survival".into(), "Horror".into()];
        let mut c = game(3, "C");
        c.tags = vec!["Survival".into(), "Horror".into()];
        let counts = tag_counts(&[a, b, c], 2);
        assert_eq!(
            counts,
            vec![
                TagCount {
                    name: "Survival".into(),
                    count: 3
                },
                TagCount {
                    name: "Horror".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn parses_query_options() {
        assert_eq!("Rating".parse::<SortOption>(), Ok(SortOption::Rating));
        assert_eq!("co-op".parse::<PlayMode>(), Ok(PlayMode::Coop));
        assert!("cheap".parse::<PriceRange>().is_err());
    }
}
