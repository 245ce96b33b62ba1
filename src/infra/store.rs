//! Storage backends for resolved pricing profiles.
//!
//! One row per ZIP; `upsert` replaces the whole row, so concurrent writers
//! for the same ZIP are last-write-wins.

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::domain::RegionalPricingProfile;

const CACHE_DIR: &str = "contractor-estimator";
const CACHE_FILENAME: &str = "pricing_cache.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache file {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode cache: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Secondary-attribute lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileFilter {
    State(String),
    Metro(String),
}

impl ProfileFilter {
    pub fn matches(&self, profile: &RegionalPricingProfile) -> bool {
        match self {
            ProfileFilter::State(state) => profile.state.eq_ignore_ascii_case(state),
            ProfileFilter::Metro(metro) => profile.metro.as_deref() == Some(metro.as_str()),
        }
    }
}

/// Aggregate view over every stored row.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub average_quality_score: f64,
    pub states_covered: usize,
    pub metros_covered: usize,
}

impl CacheStats {
    pub fn collect<'a>(
        profiles: impl IntoIterator<Item = &'a RegionalPricingProfile>,
        now: OffsetDateTime,
    ) -> Self {
        let mut stats = CacheStats::default();
        let mut quality_sum = 0u64;
        let mut states = BTreeSet::new();
        let mut metros = BTreeSet::new();
        for profile in profiles {
            stats.total += 1;
            if profile.expires_at > now {
                stats.active += 1;
            } else {
                stats.expired += 1;
            }
            quality_sum += u64::from(profile.quality_score);
            states.insert(profile.state.as_str());
            if let Some(metro) = profile.metro.as_deref() {
                metros.insert(metro);
            }
        }
        if stats.total > 0 {
            let average = quality_sum as f64 / stats.total as f64;
            stats.average_quality_score = (average * 10.0).round() / 10.0;
        }
        stats.states_covered = states.len();
        stats.metros_covered = metros.len();
        stats
    }
}

#[async_trait]
pub trait PricingStore: Send + Sync {
    async fn upsert(&self, profile: RegionalPricingProfile) -> Result<(), StoreError>;

    /// The stored row, expired or not.
    async fn fetch(&self, zip: &str) -> Result<Option<RegionalPricingProfile>, StoreError>;

    async fn fetch_where(&self, filter: &ProfileFilter) -> Result<Vec<RegionalPricingProfile>, StoreError>;

    /// Removes rows whose expiry is before `now`; returns how many went.
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError>;

    async fn all(&self) -> Result<Vec<RegionalPricingProfile>, StoreError>;

    async fn stats(&self, now: OffsetDateTime) -> Result<CacheStats, StoreError> {
        let rows = self.all().await?;
        Ok(CacheStats::collect(&rows, now))
    }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<String, RegionalPricingProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PricingStore for MemoryStore {
    async fn upsert(&self, profile: RegionalPricingProfile) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .insert(profile.zip_code.clone(), profile);
        Ok(())
    }

    async fn fetch(&self, zip: &str) -> Result<Option<RegionalPricingProfile>, StoreError> {
        Ok(self.rows.read().await.get(zip).cloned())
    }

    async fn fetch_where(&self, filter: &ProfileFilter) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|profile| filter.matches(profile))
            .cloned()
            .collect())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, profile| profile.expires_at >= now);
        Ok(before - rows.len())
    }

    async fn all(&self) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}

/// Store persisted as a single JSON document.
///
/// The whole map is rewritten through a temp file and renamed into place
/// after every mutation, so readers of the file never see a partial write.
pub struct JsonFileStore {
    path: PathBuf,
    rows: Mutex<BTreeMap<String, RegionalPricingProfile>>,
}

impl JsonFileStore {
    /// `<data dir>/contractor-estimator/pricing_cache.json`.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_DIR)
            .join(CACHE_FILENAME)
    }

    /// Opens the file, starting empty when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rows: BTreeMap<String, RegionalPricingProfile> = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(target: "cache", path = %path.display(), "no pricing cache yet");
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(target: "cache", path = %path.display(), rows = rows.len(), "opened pricing cache");
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, rows: &BTreeMap<String, RegionalPricingProfile>) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(rows)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            warn!(target: "cache", path = %tmp.display(), "failed to move cache into place");
            return Err(io_err(source));
        }
        Ok(())
    }
}

#[async_trait]
impl PricingStore for JsonFileStore {
    async fn upsert(&self, profile: RegionalPricingProfile) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        let previous = rows.insert(profile.zip_code.clone(), profile.clone());
        if let Err(err) = self.persist(&rows).await {
            // Keep memory and disk in step.
            match previous {
                Some(previous) => rows.insert(profile.zip_code, previous),
                None => rows.remove(&profile.zip_code),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn fetch(&self, zip: &str) -> Result<Option<RegionalPricingProfile>, StoreError> {
        Ok(self.rows.lock().await.get(zip).cloned())
    }

    async fn fetch_where(&self, filter: &ProfileFilter) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|profile| filter.matches(profile))
            .cloned()
            .collect())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock().await;
        let expired: Vec<String> = rows
            .iter()
            .filter(|(_, profile)| profile.expires_at < now)
            .map(|(zip, _)| zip.clone())
            .collect();
        if expired.is_empty() {
            return Ok(0);
        }
        let mut remaining = rows.clone();
        for zip in &expired {
            remaining.remove(zip);
        }
        self.persist(&remaining).await?;
        *rows = remaining;
        Ok(expired.len())
    }

    async fn all(&self) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        Ok(self.rows.lock().await.values().cloned().collect())
    }
}
