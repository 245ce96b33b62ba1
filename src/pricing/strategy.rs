//! Ordered labor-rate strategies: metro survey, then national average, then
//! the built-in table. The first strategy that answers wins.

use std::{future::Future, sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::domain::{LaborSource, Trade};
use crate::infra::{LaborRateSource, SourceError, SurveyArea};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_ORDER: [LaborSource; 3] = [
    LaborSource::MetroSurvey,
    LaborSource::NationalAverage,
    LaborSource::FallbackTable,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedRate {
    pub rate: f64,
    pub source: LaborSource,
}

/// Runs an external call under a deadline. Errors and timeouts both become
/// `None`, and the caller moves on to its next option.
pub async fn bounded<T, F>(what: &str, timeout: Duration, call: F) -> Option<T>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(source = what, error = %err, "external source failed");
            None
        }
        Err(_) => {
            warn!(source = what, timeout_ms = timeout.as_millis() as u64, "external source timed out");
            None
        }
    }
}

#[derive(Clone)]
pub struct LaborStrategyChain {
    source: Arc<dyn LaborRateSource>,
    order: Vec<LaborSource>,
    timeout: Duration,
    year: u16,
}

impl LaborStrategyChain {
    pub fn new(source: Arc<dyn LaborRateSource>, year: u16) -> Self {
        Self {
            source,
            order: DEFAULT_ORDER.to_vec(),
            timeout: DEFAULT_TIMEOUT,
            year,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn order(&self) -> &[LaborSource] {
        &self.order
    }

    /// Hourly rate for a trade. `area_code` is the metro survey area, if the
    /// ZIP sits in one.
    pub async fn resolve(&self, trade: Trade, area_code: Option<&str>) -> ResolvedRate {
        for strategy in &self.order {
            if let Some(rate) = self.attempt(*strategy, trade, area_code).await {
                debug!(trade = %trade, source = strategy.tag(), rate, "labor rate resolved");
                return ResolvedRate {
                    rate,
                    source: *strategy,
                };
            }
        }
        ResolvedRate {
            rate: trade.fallback_labor_rate(),
            source: LaborSource::FallbackTable,
        }
    }

    async fn attempt(&self, strategy: LaborSource, trade: Trade, area_code: Option<&str>) -> Option<f64> {
        let area = match strategy {
            LaborSource::MetroSurvey => SurveyArea::Metro(area_code?.to_string()),
            LaborSource::NationalAverage => SurveyArea::National,
            LaborSource::FallbackTable => return Some(trade.fallback_labor_rate()),
        };
        let call = self
            .source
            .hourly_rate(trade.occupation_code(), &area, self.year);
        bounded(strategy.tag(), self.timeout, call).await.flatten()
    }
}
