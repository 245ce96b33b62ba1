//! Request-level entry point: validate, price regionally, calculate, combine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    calculators, estimate, is_valid_zip, CalculatorResult, FieldCatalog, FinalEstimate,
    RegionalPricingProfile, Trade, TradeCriteria, UnknownTrade, ValidationError,
};
use crate::pricing::PricingResolver;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub trade: String,
    pub zip_code: String,
    #[serde(default)]
    pub criteria: TradeCriteria,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub estimate_id: Uuid,
    pub trade: Trade,
    pub zip_code: String,
    pub estimate: FinalEstimate,
    pub calculation: CalculatorResult,
    pub pricing: Option<RegionalPricingProfile>,
    /// Set when no regional profile could be resolved and baseline pricing
    /// was used instead.
    pub low_confidence: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    UnknownTrade(#[from] UnknownTrade),
    #[error("invalid ZIP code `{0}`, expected 5 digits")]
    InvalidZip(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub struct EstimateEngine {
    catalog: Arc<FieldCatalog>,
    resolver: Arc<PricingResolver>,
    tax_rate: f64,
}

impl EstimateEngine {
    pub fn new(catalog: Arc<FieldCatalog>, resolver: Arc<PricingResolver>) -> Self {
        Self {
            catalog,
            resolver,
            tax_rate: estimate::DEFAULT_TAX_RATE,
        }
    }

    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &PricingResolver {
        &self.resolver
    }

    pub async fn estimate(&self, request: &EstimateRequest) -> Result<EstimateResponse, EstimateError> {
        let trade: Trade = request.trade.parse()?;
        let zip = request.zip_code.trim();
        if !is_valid_zip(zip) {
            return Err(EstimateError::InvalidZip(request.zip_code.clone()));
        }
        self.catalog.validate(trade, &request.criteria)?;

        let pricing = self.resolver.resolve_pricing(zip).await;
        if pricing.is_none() {
            warn!(trade = %trade, zip, "no regional pricing, using baseline");
        }

        let calculation = calculators::calculate(trade, &request.criteria);
        let estimate = estimate::combine(trade, &calculation, pricing.as_ref(), self.tax_rate);
        let response = EstimateResponse {
            estimate_id: Uuid::new_v4(),
            trade,
            zip_code: zip.to_string(),
            low_confidence: pricing.is_none(),
            estimate,
            calculation,
            pricing,
            generated_at: OffsetDateTime::now_utc(),
        };
        info!(
            estimate_id = %response.estimate_id,
            trade = %trade,
            zip,
            total = response.estimate.total,
            low_confidence = response.low_confidence,
            "estimate generated"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{calculators::test_support::*, FieldIssue};
    use crate::infra::MemoryStore;
    use crate::pricing::{
        resolver::test_support::reference, strategy::test_support::FakeSurvey, LaborStrategyChain,
        PricingCache,
    };

    fn engine() -> EstimateEngine {
        let resolver = PricingResolver::new(
            reference(),
            PricingCache::new(Arc::new(MemoryStore::new())),
            LaborStrategyChain::new(Arc::new(FakeSurvey::default()), 2024),
        );
        EstimateEngine::new(
            Arc::new(FieldCatalog::embedded().unwrap()),
            Arc::new(resolver),
        )
    }

    fn request(trade: &str, zip: &str, criteria: TradeCriteria) -> EstimateRequest {
        EstimateRequest {
            trade: trade.into(),
            zip_code: zip.into(),
            criteria,
        }
    }

    #[tokio::test]
    async fn regional_estimate_uses_resolved_profile() {
        let engine = engine();
        let criteria = criteria(&[("squareFeet", num(1800.0))]);

        let response = engine
            .estimate(&request("painting", "60602", criteria.clone()))
            .await
            .unwrap();

        let profile = response.pricing.clone().unwrap();
        assert!(!response.low_confidence);
        assert_eq!(profile.metro.as_deref(), Some("Chicago"));
        let expected = estimate::combine(
            Trade::Painting,
            &calculators::calculate(Trade::Painting, &criteria),
            Some(&profile),
            estimate::DEFAULT_TAX_RATE,
        );
        assert_eq!(response.estimate, expected);
        assert_eq!(response.estimate.permit_cost, 172.5);
    }

    #[tokio::test]
    async fn unresolvable_zip_falls_back_to_baseline() {
        let engine = engine();
        let criteria = criteria(&[("squareFeet", num(400.0)), ("flooringType", text("tile"))]);

        let response = engine
            .estimate(&request("Flooring", "99999", criteria.clone()))
            .await
            .unwrap();

        assert!(response.low_confidence);
        assert_eq!(response.pricing, None);
        assert_eq!(response.trade, Trade::Flooring);
        let baseline = estimate::combine(
            Trade::Flooring,
            &calculators::calculate(Trade::Flooring, &criteria),
            None,
            estimate::DEFAULT_TAX_RATE,
        );
        assert_eq!(response.estimate, baseline);
        assert_eq!(response.estimate.labor_rate, 40.0);
    }

    #[tokio::test]
    async fn rejects_bad_requests_before_pricing() {
        let engine = engine();

        let unknown = engine.estimate(&request("masonry", "60602", TradeCriteria::default())).await;
        assert!(matches!(unknown, Err(EstimateError::UnknownTrade(_))));

        let bad_zip = engine
            .estimate(&request("roofing", "6060", criteria(&[("squareFeet", num(1500.0))])))
            .await;
        assert!(matches!(bad_zip, Err(EstimateError::InvalidZip(zip)) if zip == "6060"));

        let missing = engine.estimate(&request("roofing", "60602", TradeCriteria::default())).await;
        match missing {
            Err(EstimateError::Validation(err)) => assert_eq!(
                err.issues,
                vec![FieldIssue::Missing {
                    field: "squareFeet".into()
                }]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(engine.resolver().cache().get("60602").await.unwrap().is_none());
    }

    #[test]
    fn request_deserializes_from_handler_json() {
        let request: EstimateRequest = serde_json::from_str(
            r#"{"trade":"hvac","zipCode":"77002","criteria":{"squareFeet":2400,"zones":2}}"#,
        )
        .unwrap();
        assert_eq!(request.zip_code, "77002");
        assert_eq!(request.criteria.number_or("zones", 1.0), 2.0);
    }
}
