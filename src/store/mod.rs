pub mod cache;

pub use cache::{CacheError, CacheInfo, CacheSnapshot, CacheStore, Fallback, CURRENT_VERSION};
