//! Keeps the pricing cache warm.
//!
//! Two schedules run independently:
//! 1. A weekly refresh of every county-seat ZIP, in sequential batches
//!    resolved concurrently inside each batch.
//! 2. A daily sweep that deletes expired cache rows.
//!
//! Both entry points can also be called directly for a manual run. A second
//! refresh started while one is in flight is rejected.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::resolver::PricingResolver;
use crate::infra::StoreError;

/// Shortest period either background loop accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// ZIPs resolved concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches to stay under external rate limits.
    pub batch_delay: Duration,
    pub refresh_interval: Duration,
    pub cleanup_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_delay: Duration::from_secs(2),
            refresh_interval: Duration::from_secs(7 * 24 * 60 * 60),
            cleanup_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl SchedulerConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Periods shorter than [`MIN_INTERVAL`] are raised to it.
    pub fn with_intervals(mut self, refresh: Duration, cleanup: Duration) -> Self {
        self.refresh_interval = refresh.max(MIN_INTERVAL);
        self.cleanup_interval = cleanup.max(MIN_INTERVAL);
        self
    }
}

/// Outcome of one full county-seat refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub total: usize,
    pub refreshed: usize,
    pub failed: usize,
    pub failed_zips: Vec<String>,
    pub batches: usize,
    /// `round(refreshed / total × 100)`.
    pub quality_score: u8,
    pub elapsed_ms: u64,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("a county-seat refresh is already running")]
    RefreshInProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handles for the two background loops.
pub struct ScheduleHandles {
    pub refresh: JoinHandle<()>,
    pub cleanup: JoinHandle<()>,
}

impl ScheduleHandles {
    pub fn abort(&self) {
        self.refresh.abort();
        self.cleanup.abort();
    }
}

pub struct RefreshScheduler {
    resolver: Arc<PricingResolver>,
    config: SchedulerConfig,
    running: AtomicBool,
}

/// Clears the in-progress flag when a refresh ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RefreshScheduler {
    pub fn new(resolver: Arc<PricingResolver>, config: SchedulerConfig) -> Self {
        Self {
            resolver,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Re-resolves every county-seat ZIP. Individual failures are counted,
    /// never fatal.
    pub async fn refresh_county_seats(&self) -> Result<RefreshReport, SchedulerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SchedulerError::RefreshInProgress);
        }
        let _guard = RunningGuard(&self.running);

        let started = Instant::now();
        let worklist = self.resolver.reference().worklist();
        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[String]> = worklist.chunks(batch_size).collect();
        info!(zips = worklist.len(), batches = batches.len(), "starting county-seat refresh");

        let mut refreshed = 0;
        let mut failed_zips = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let results = join_all(batch.iter().map(|zip| self.resolver.refresh_zip(zip))).await;
            for (zip, result) in batch.iter().zip(results) {
                match result {
                    Ok(_) => refreshed += 1,
                    Err(err) => {
                        warn!(zip = %zip, error = %err, "refresh failed");
                        failed_zips.push(zip.clone());
                    }
                }
            }
            info!(batch = index + 1, of = batches.len(), refreshed, failed = failed_zips.len(), "batch done");

            if index + 1 < batches.len() && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        let total = worklist.len();
        let report = RefreshReport {
            total,
            refreshed,
            failed: failed_zips.len(),
            failed_zips,
            batches: batches.len(),
            quality_score: quality_score(refreshed, total),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            total = report.total,
            refreshed = report.refreshed,
            failed = report.failed,
            quality = report.quality_score,
            "county-seat refresh complete"
        );
        Ok(report)
    }

    pub async fn clean_expired_cache(&self) -> Result<usize, SchedulerError> {
        Ok(self.resolver.cache().clean_expired().await?)
    }

    /// Starts the weekly refresh and daily cleanup loops. Neither runs at
    /// startup; the first pass happens one interval later.
    pub fn spawn(self: Arc<Self>) -> ScheduleHandles {
        let refresher = Arc::clone(&self);
        let refresh = tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresher.config.refresh_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                match refresher.refresh_county_seats().await {
                    Ok(_) => {}
                    Err(SchedulerError::RefreshInProgress) => {
                        warn!("skipping scheduled refresh, previous run still active")
                    }
                    Err(err) => error!(error = %err, "scheduled refresh failed"),
                }
            }
        });

        let cleaner = self;
        let cleanup = tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleaner.config.cleanup_interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(err) = cleaner.clean_expired_cache().await {
                    error!(error = %err, "scheduled cache cleanup failed");
                }
            }
        });

        ScheduleHandles { refresh, cleanup }
    }
}

fn quality_score(refreshed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((refreshed as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use time::OffsetDateTime;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::domain::{CountySeatRecord, ReferenceData, RegionalPricingProfile};
    use crate::infra::{
        CacheStats, LaborRateSource, MemoryStore, PricingStore, ProfileFilter, SourceError, SurveyArea,
    };
    use crate::pricing::{strategy::test_support::FakeSurvey, LaborStrategyChain, PricingCache};

    /// Memory store that refuses writes for selected ZIPs.
    struct RejectingStore {
        inner: MemoryStore,
        reject: HashSet<String>,
    }

    #[async_trait]
    impl PricingStore for RejectingStore {
        async fn upsert(&self, profile: RegionalPricingProfile) -> Result<(), StoreError> {
            if self.reject.contains(&profile.zip_code) {
                return Err(StoreError::Io {
                    path: "rejecting".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.upsert(profile).await
        }

        async fn fetch(&self, zip: &str) -> Result<Option<RegionalPricingProfile>, StoreError> {
            self.inner.fetch(zip).await
        }

        async fn fetch_where(&self, filter: &ProfileFilter) -> Result<Vec<RegionalPricingProfile>, StoreError> {
            self.inner.fetch_where(filter).await
        }

        async fn delete_expired(&self, now: OffsetDateTime) -> Result<usize, StoreError> {
            self.inner.delete_expired(now).await
        }

        async fn all(&self) -> Result<Vec<RegionalPricingProfile>, StoreError> {
            self.inner.all().await
        }
    }

    /// Survey whose calls wait for a permit, so a refresh can be held open.
    struct GatedSurvey(Arc<Semaphore>);

    #[async_trait]
    impl LaborRateSource for GatedSurvey {
        async fn hourly_rate(&self, _: &str, _: &SurveyArea, _: u16) -> Result<Option<f64>, SourceError> {
            let _permit = self.0.acquire().await.map_err(|_| SourceError::Api("closed".into()))?;
            Ok(None)
        }
    }

    fn fifty_seats() -> Arc<ReferenceData> {
        let seats = (0..50)
            .map(|i| CountySeatRecord {
                zip: format!("{:05}", 10000 + i),
                county: format!("County {i}"),
                state: "NY".into(),
                metro: None,
            })
            .collect();
        Arc::new(ReferenceData::new(seats, Vec::new()))
    }

    fn scheduler(store: Arc<dyn PricingStore>, survey: Arc<dyn LaborRateSource>, batch_size: usize) -> RefreshScheduler {
        let resolver = PricingResolver::new(
            fifty_seats(),
            PricingCache::new(store),
            LaborStrategyChain::new(survey, 2024),
        );
        RefreshScheduler::new(
            Arc::new(resolver),
            SchedulerConfig::default()
                .with_batch_size(batch_size)
                .with_batch_delay(Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn one_failure_in_fifty_is_tolerated() {
        let store = Arc::new(RejectingStore {
            inner: MemoryStore::new(),
            reject: HashSet::from(["10007".to_string()]),
        });
        let scheduler = scheduler(store.clone(), Arc::new(FakeSurvey::default()), 50);

        let report = scheduler.refresh_county_seats().await.unwrap();

        assert_eq!(report.total, 50);
        assert_eq!(report.refreshed, 49);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_zips, vec!["10007".to_string()]);
        assert_eq!(report.batches, 1);
        assert_eq!(report.quality_score, 98);
        assert_eq!(store.all().await.unwrap().len(), 49);
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn batches_cover_the_whole_worklist() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler(store.clone(), Arc::new(FakeSurvey::default()), 15);

        let report = scheduler.refresh_county_seats().await.unwrap();

        assert_eq!(report.batches, 4);
        assert_eq!(report.refreshed, 50);
        assert_eq!(report.quality_score, 100);
        let stats: CacheStats = store.stats(OffsetDateTime::now_utc()).await.unwrap();
        assert_eq!(stats.active, 50);
    }

    #[tokio::test]
    async fn concurrent_refresh_is_rejected() {
        let gate = Arc::new(Semaphore::new(0));
        let scheduler = Arc::new(scheduler(
            Arc::new(MemoryStore::new()),
            Arc::new(GatedSurvey(gate.clone())),
            50,
        ));

        let first = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.refresh_county_seats().await }
        });
        while !scheduler.is_running() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            scheduler.refresh_county_seats().await,
            Err(SchedulerError::RefreshInProgress)
        ));

        gate.add_permits(Semaphore::MAX_PERMITS / 2);
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.refreshed, 50);
        assert!(!scheduler.is_running());
        assert!(scheduler.refresh_county_seats().await.is_ok());
    }

    #[tokio::test]
    async fn manual_cleanup_delegates_to_cache() {
        let store = Arc::new(MemoryStore::new());
        let mut stale = crate::infra::store::test_support::profile("10001", "NY", None, 100, 0);
        stale.expires_at = OffsetDateTime::now_utc() - time::Duration::days(1);
        store.upsert(stale).await.unwrap();

        let scheduler = scheduler(store, Arc::new(FakeSurvey::default()), 50);
        assert_eq!(scheduler.clean_expired_cache().await.unwrap(), 1);
    }

    #[test]
    fn zero_intervals_are_raised_to_the_minimum() {
        let config = SchedulerConfig::default().with_intervals(Duration::ZERO, Duration::from_millis(10));
        assert_eq!(config.refresh_interval, MIN_INTERVAL);
        assert_eq!(config.cleanup_interval, MIN_INTERVAL);

        let hourly = SchedulerConfig::default().with_intervals(Duration::from_secs(3600), Duration::from_secs(3600));
        assert_eq!(hourly.refresh_interval, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn spawned_loops_survive_zero_interval_config() {
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::new(PricingResolver::new(
                fifty_seats(),
                PricingCache::new(Arc::new(MemoryStore::new())),
                LaborStrategyChain::new(Arc::new(FakeSurvey::default()), 2024),
            )),
            SchedulerConfig::default().with_intervals(Duration::ZERO, Duration::ZERO),
        ));

        let handles = Arc::clone(&scheduler).spawn();
        tokio::task::yield_now().await;
        assert!(!handles.refresh.is_finished());
        assert!(!handles.cleanup.is_finished());
        handles.abort();
    }

    #[test]
    fn quality_rounds_to_nearest() {
        assert_eq!(quality_score(49, 50), 98);
        assert_eq!(quality_score(2, 3), 67);
        assert_eq!(quality_score(0, 0), 0);
    }
}
