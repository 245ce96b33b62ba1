//! ZIP → regional pricing profile.
//!
//! Resolution order: cache, then a fresh computation anchored on the ZIP's
//! county seat (or the nearest seat by prefix), with labor rates from the
//! strategy chain and material drift from the retail source.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use futures::future::join_all;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{
    cache::{PricingCache, DEFAULT_EXPIRY_DAYS},
    strategy::{bounded, LaborStrategyChain, DEFAULT_TIMEOUT},
};
use crate::domain::{
    calculators::round2, is_valid_zip, CountySeatRecord, ReferenceData, RegionalPricingProfile, Trade,
};
use crate::infra::{RetailPriceSource, StoreError};

const BASE_PERMIT_COST: f64 = 150.0;
const DRIFT_FLOOR: f64 = 0.85;
const DRIFT_CEILING: f64 = 1.25;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid ZIP code `{0}`")]
    InvalidZip(String),
    #[error("no reference data near ZIP {0}")]
    NoAnchor(String),
    #[error("failed to cache profile for {zip}: {source}")]
    CacheWrite {
        zip: String,
        #[source]
        source: StoreError,
    },
}

pub struct PricingResolver {
    reference: Arc<ReferenceData>,
    cache: PricingCache,
    labor: LaborStrategyChain,
    retail: Option<Arc<dyn RetailPriceSource>>,
    expiry_days: u32,
    request_timeout: Duration,
}

impl PricingResolver {
    pub fn new(reference: Arc<ReferenceData>, cache: PricingCache, labor: LaborStrategyChain) -> Self {
        Self {
            reference,
            cache,
            labor,
            retail: None,
            expiry_days: DEFAULT_EXPIRY_DAYS,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_retail(mut self, retail: Arc<dyn RetailPriceSource>) -> Self {
        self.retail = Some(retail);
        self
    }

    pub fn with_expiry_days(mut self, days: u32) -> Self {
        self.expiry_days = days;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &PricingCache {
        &self.cache
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Profile for `zip`, or `None` when nothing can be resolved and the
    /// caller should price from the baseline. Cache failures never surface.
    pub async fn resolve_pricing(&self, zip: &str) -> Option<RegionalPricingProfile> {
        match self.cache.get(zip).await {
            Ok(Some(profile)) => return Some(profile),
            Ok(None) => {}
            Err(err) => warn!(zip, error = %err, "cache read failed, resolving fresh"),
        }

        let profile = match self.compute(zip).await {
            Ok(profile) => profile,
            Err(err) => {
                info!(zip, reason = %err, "pricing resolution miss");
                return None;
            }
        };

        match self.cache.set(zip, profile.clone(), self.expiry_days).await {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(zip, error = %err, "failed to cache resolved profile");
                Some(profile)
            }
        }
    }

    /// Recomputes and stores the profile without consulting the cache.
    pub async fn refresh_zip(&self, zip: &str) -> Result<RegionalPricingProfile, ResolveError> {
        let profile = self.compute(zip).await?;
        self.cache
            .set(zip, profile, self.expiry_days)
            .await
            .map_err(|source| ResolveError::CacheWrite {
                zip: zip.to_string(),
                source,
            })
    }

    async fn compute(&self, zip: &str) -> Result<RegionalPricingProfile, ResolveError> {
        if !is_valid_zip(zip) {
            return Err(ResolveError::InvalidZip(zip.to_string()));
        }
        let (anchor, interpolated_from) = self.anchor_for(zip)?;
        let metro = anchor
            .metro
            .as_deref()
            .and_then(|name| self.reference.metro(name));
        let cost_index = metro.map_or(1.0, |metro| metro.cost_index);
        let area_code = metro.and_then(|metro| metro.area_code.as_deref());

        let (rates, drift) = futures::join!(
            join_all(
                Trade::ALL
                    .into_iter()
                    .map(|trade| async move { (trade, self.labor.resolve(trade, area_code).await) })
            ),
            self.retail_drift()
        );

        let mut data_sources = Vec::new();
        match &interpolated_from {
            Some(seat) => data_sources.push(format!("reference:interpolated:{seat}")),
            None => data_sources.push("reference:county-seat".to_string()),
        }
        if let Some(metro) = metro {
            data_sources.push(format!("metro:{}", metro.name));
        }
        for (_, resolved) in &rates {
            let tag = resolved.source.tag().to_string();
            if !data_sources.contains(&tag) {
                data_sources.push(tag);
            }
        }
        if drift.is_some() {
            data_sources.push("retail".to_string());
        }

        let live = rates.iter().filter(|(_, resolved)| resolved.source.is_live()).count();
        let quality_score = ((live as f64 / rates.len() as f64) * 100.0).round() as u8;
        let trade_labor_rates: BTreeMap<Trade, f64> = rates
            .iter()
            .map(|(trade, resolved)| (*trade, round2(resolved.rate)))
            .collect();
        let labor_rate = round2(trade_labor_rates.values().sum::<f64>() / trade_labor_rates.len() as f64);

        let now = OffsetDateTime::now_utc();
        let profile = RegionalPricingProfile {
            zip_code: zip.to_string(),
            county: anchor.county.clone(),
            state: anchor.state.clone(),
            metro: metro.map(|metro| metro.name.clone()),
            material_multiplier: round2(cost_index * drift.unwrap_or(1.0)),
            labor_rate,
            trade_labor_rates,
            permit_cost: round2(BASE_PERMIT_COST * cost_index),
            weather_factor: self.reference.weather_factor(&anchor.state),
            data_sources,
            quality_score,
            interpolated_from,
            last_updated: now,
            expires_at: now + time::Duration::days(i64::from(self.expiry_days)),
        };
        debug!(
            zip,
            county = %profile.county,
            state = %profile.state,
            quality = profile.quality_score,
            "computed pricing profile"
        );
        Ok(profile)
    }

    fn anchor_for(&self, zip: &str) -> Result<(&CountySeatRecord, Option<String>), ResolveError> {
        if let Some(seat) = self.reference.find_zip(zip) {
            return Ok((seat, None));
        }
        let seat = self
            .reference
            .interpolate_zip(zip)
            .ok_or_else(|| ResolveError::NoAnchor(zip.to_string()))?;
        debug!(zip, anchor = %seat.zip, "interpolated from county seat");
        Ok((seat, Some(seat.zip.clone())))
    }

    /// Mean of median-retail / catalog price across the trades the retail
    /// source answered for, clamped. `None` when it answered for none.
    async fn retail_drift(&self) -> Option<f64> {
        let retail = self.retail.as_ref()?;
        let ratios = join_all(Trade::ALL.into_iter().map(|trade| async move {
            let (term, benchmark) = trade.benchmark_material();
            match bounded("retail", self.request_timeout, retail.search(term)).await {
                Some(candidates) => {
                    let prices: Vec<f64> = candidates.into_iter().map(|candidate| candidate.price).collect();
                    median(prices).map(|median| median / benchmark)
                }
                None => None,
            }
        }))
        .await;

        let answered: Vec<f64> = ratios.into_iter().flatten().collect();
        if answered.is_empty() {
            return None;
        }
        let mean = answered.iter().sum::<f64>() / answered.len() as f64;
        Some(mean.clamp(DRIFT_FLOOR, DRIFT_CEILING))
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
