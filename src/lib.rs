//! Survival games catalog: collects listings from SteamSpy and the Steam
//! store, merges them into one record per title, keeps the result in a JSON
//! cache and serves it through a small read-only API.

pub mod api;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod logging;
pub mod merge;
pub mod model;
pub mod normalization;
pub mod similarity;
pub mod sources;
pub mod store;

pub mod util {
    pub mod env;
}
