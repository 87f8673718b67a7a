use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::model::{AppId, GameRecord};

/// Schema version written into every snapshot.
pub const CURRENT_VERSION: u32 = 1;

/// Sample catalog shipped with the binary for cache-less environments.
pub const BUNDLED_FALLBACK: &str = include_str!("../../data/fallback-games.json");

/// Persisted dataset: the whole collection plus its write time and schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    #[serde(alias = "games")]
    pub records: Vec<GameRecord>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub exists: bool,
    pub record_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Where `get_all` looks when the cache has nothing to offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    Bundled,
    File(PathBuf),
    Disabled,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("creating cache directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("writing cache file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("serializing cache snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reasons a snapshot could not be used. Never leaves this module.
#[derive(Debug, Error)]
enum CacheMiss {
    #[error("cache file not found")]
    Missing,
    #[error("cache file unreadable: {0}")]
    Unreadable(io::Error),
    #[error("cache file corrupt: {0}")]
    Corrupt(serde_json::Error),
    #[error("cache version {found:?} does not match expected {expected}")]
    VersionMismatch { found: Option<u64>, expected: u32 },
}

/// JSON-file snapshot of the merged catalog.
///
/// Writes replace the whole file through a rename so readers only ever see a
/// complete snapshot. A single writer is assumed.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    version: u32,
    stale_after: chrono::Duration,
    fallback: Fallback,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            version: CURRENT_VERSION,
            stale_after: chrono::Duration::hours(24),
            fallback: Fallback::Bundled,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_stale_after(mut self, stale_after: chrono::Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Replaces the persisted snapshot with `records`, stamped now.
    pub async fn write(&self, records: &[GameRecord]) -> Result<CacheSnapshot, CacheError> {
        self.write_at(records, Utc::now()).await
    }

    pub async fn write_at(
        &self,
        records: &[GameRecord],
        now: DateTime<Utc>,
    ) -> Result<CacheSnapshot, CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let snapshot = CacheSnapshot {
            records: records.to_vec(),
            updated_at: now,
            version: self.version,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.temp_path();
        if let Err(source) = write_synced(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Write {
                path: tmp,
                source,
            });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Write {
                path: self.path.clone(),
                source,
            });
        }

        info!(
            path = %self.path.display(),
            records = snapshot.records.len(),
            version = self.version,
            "cache: wrote snapshot"
        );
        Ok(snapshot)
    }

    /// Persisted records, or empty when the cache is missing, corrupt or of
    /// another schema version.
    pub async fn read(&self) -> Vec<GameRecord> {
        match self.load().await {
            Ok(snapshot) => snapshot.records,
            Err(CacheMiss::Missing) => {
                debug!(path = %self.path.display(), "cache: no snapshot on disk");
                Vec::new()
            }
            Err(miss) => {
                warn!(path = %self.path.display(), reason = %miss, "cache: ignoring snapshot");
                Vec::new()
            }
        }
    }

    /// Cached records when there are any, otherwise the fallback dataset.
    pub async fn get_all(&self) -> Vec<GameRecord> {
        let cached = self.read().await;
        if !cached.is_empty() {
            return cached;
        }
        info!("cache: empty; serving fallback dataset");
        self.read_fallback().await
    }

    pub async fn get_by_id(&self, app_id: AppId) -> Option<GameRecord> {
        self.get_all().await.into_iter().find(|r| r.appid == app_id)
    }

    pub async fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now()).await
    }

    /// True when there is no usable snapshot or it is older than the threshold.
    pub async fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match self.load().await {
            Ok(snapshot) => now.signed_duration_since(snapshot.updated_at) > self.stale_after,
            Err(_) => true,
        }
    }

    /// Presence, size and age of the on-disk snapshot, regardless of version.
    pub async fn info(&self) -> CacheInfo {
        let parsed = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<CacheSnapshot>(&bytes).ok(),
            Err(_) => None,
        };
        match parsed {
            Some(snapshot) => CacheInfo {
                exists: true,
                record_count: snapshot.records.len(),
                updated_at: Some(snapshot.updated_at),
            },
            None => CacheInfo {
                exists: false,
                record_count: 0,
                updated_at: None,
            },
        }
    }

    async fn load(&self) -> Result<CacheSnapshot, CacheMiss> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CacheMiss::Missing),
            Err(e) => return Err(CacheMiss::Unreadable(e)),
        };
        let value: Value = serde_json::from_slice(&bytes).map_err(CacheMiss::Corrupt)?;
        let found = value.get("version").and_then(Value::as_u64);
        if found != Some(u64::from(self.version)) {
            return Err(CacheMiss::VersionMismatch {
                found,
                expected: self.version,
            });
        }
        serde_json::from_value(value).map_err(CacheMiss::Corrupt)
    }

    async fn read_fallback(&self) -> Vec<GameRecord> {
        let parsed = match &self.fallback {
            Fallback::Disabled => return Vec::new(),
            Fallback::Bundled => serde_json::from_str::<CacheSnapshot>(BUNDLED_FALLBACK),
            Fallback::File(path) => match tokio::fs::read(path).await {
                Ok(bytes) => serde_json::from_slice::<CacheSnapshot>(&bytes),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache: fallback dataset unreadable");
                    return Vec::new();
                }
            },
        };
        match parsed {
            Ok(snapshot) => snapshot.records,
            Err(e) => {
                warn!(error = %e, "cache: fallback dataset corrupt");
                Vec::new()
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache.json".into());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
