//! Joins the two sources into [`GameRecord`]s.
//!
//! For ids present in both sources the store supplies the descriptive fields
//! (name, description, images, price, release date, genres, play modes) and
//! SteamSpy supplies review counts, ownership and playtime. Tags are the union
//! of SteamSpy tags and store genres. Ids seen in only one source still produce
//! a record, with the other side's fields left at their zero values.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::model::{AppId, Categories, GameRecord, Price, Reviews};
use crate::normalization::tags::union_tags;
use crate::sources::{SpyGame, StoreGame};

/// Merges both source maps. Output is ordered by app id.
pub fn merge(
    spy: &HashMap<AppId, SpyGame>,
    store: &HashMap<AppId, StoreGame>,
    updated_at: DateTime<Utc>,
) -> Vec<GameRecord> {
    let ids: BTreeSet<AppId> = spy.keys().chain(store.keys()).copied().collect();
    ids.into_iter()
        .filter_map(|id| merge_one(id, spy.get(&id), store.get(&id), updated_at))
        .collect()
}

/// Builds one record from whichever sides are present.
pub fn merge_one(
    app_id: AppId,
    spy: Option<&SpyGame>,
    store: Option<&StoreGame>,
    updated_at: DateTime<Utc>,
) -> Option<GameRecord> {
    if spy.is_none() && store.is_none() {
        return None;
    }

    let spy_tags: &[String] = spy.map(|s| s.tags.as_slice()).unwrap_or_default();
    let genres: &[String] = store.map(|s| s.genres.as_slice()).unwrap_or_default();

    let name = store
        .map(|s| s.name.as_str())
        .filter(|n| !n.trim().is_empty())
        .or_else(|| spy.map(|s| s.name.as_str()))
        .unwrap_or_default()
        .to_string();

    let reviews = spy
        .map(|s| Reviews::new(s.positive, s.negative))
        .unwrap_or_default();

    Some(GameRecord {
        appid: app_id,
        name,
        description: store.map(|s| s.description.clone()).unwrap_or_default(),
        header_image: store.map(|s| s.header_image.clone()).unwrap_or_default(),
        screenshots: store.map(|s| s.screenshots.clone()).unwrap_or_default(),
        price: store.map(|s| s.price).unwrap_or_else(Price::default),
        reviews,
        release_date: store.map(|s| s.release_date.clone()).unwrap_or_default(),
        tags: union_tags([spy_tags, genres]),
        genres: genres.to_vec(),
        categories: store.map(|s| s.categories).unwrap_or_else(Categories::default),
        owners: spy.map(|s| s.owners.clone()).unwrap_or_default(),
        playtime: spy.map(|s| s.average_playtime).unwrap_or_default(),
        updated_at,
    })
}
