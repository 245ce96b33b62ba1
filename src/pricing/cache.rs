//! Expiring view over a [`PricingStore`].

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::domain::RegionalPricingProfile;
use crate::infra::{CacheStats, PricingStore, ProfileFilter, StoreError};

pub const DEFAULT_EXPIRY_DAYS: u32 = 14;

#[derive(Clone)]
pub struct PricingCache {
    store: Arc<dyn PricingStore>,
}

impl PricingCache {
    pub fn new(store: Arc<dyn PricingStore>) -> Self {
        Self { store }
    }

    /// A live profile for `zip`. Rows past their expiry read as a miss even
    /// when they are still stored.
    pub async fn get(&self, zip: &str) -> Result<Option<RegionalPricingProfile>, StoreError> {
        let now = OffsetDateTime::now_utc();
        let profile = self.store.fetch(zip).await?;
        match profile {
            Some(profile) if !profile.is_expired_at(now) => {
                debug!(target: "cache", zip, "hit");
                Ok(Some(profile))
            }
            Some(_) => {
                debug!(target: "cache", zip, "expired row");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Upserts the profile under `zip`, restamping its timestamps.
    pub async fn set(
        &self,
        zip: &str,
        mut profile: RegionalPricingProfile,
        expiry_days: u32,
    ) -> Result<RegionalPricingProfile, StoreError> {
        let now = OffsetDateTime::now_utc();
        profile.zip_code = zip.to_string();
        profile.last_updated = now;
        profile.expires_at = now + Duration::days(i64::from(expiry_days));
        self.store.upsert(profile.clone()).await?;
        debug!(target: "cache", zip, expires_at = %profile.expires_at, "stored profile");
        Ok(profile)
    }

    pub async fn get_by_state(&self, state: &str) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        self.live_where(ProfileFilter::State(state.to_string())).await
    }

    pub async fn get_by_metro(&self, metro: &str) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        self.live_where(ProfileFilter::Metro(metro.to_string())).await
    }

    /// Deletes expired rows. Safe to run alongside reads and writes.
    pub async fn clean_expired(&self) -> Result<usize, StoreError> {
        let removed = self.store.delete_expired(OffsetDateTime::now_utc()).await?;
        info!(target: "cache", removed, "cleaned expired pricing profiles");
        Ok(removed)
    }

    pub async fn get_stats(&self) -> Result<CacheStats, StoreError> {
        self.store.stats(OffsetDateTime::now_utc()).await
    }

    async fn live_where(&self, filter: ProfileFilter) -> Result<Vec<RegionalPricingProfile>, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut rows: Vec<_> = self
            .store
            .fetch_where(&filter)
            .await?
            .into_iter()
            .filter(|profile| !profile.is_expired_at(now))
            .collect();
        rows.sort_by(|a, b| a.zip_code.cmp(&b.zip_code));
        Ok(rows)
    }
}
