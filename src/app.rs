//! Wires configuration into the live services.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    config::Config,
    domain::{FieldCatalog, ReferenceData},
    engine::EstimateEngine,
    infra::{BlsClient, JsonFileStore, RetailApiClient, SourceError, StoreError},
    pricing::{LaborStrategyChain, PricingCache, PricingResolver, RefreshScheduler},
    util::assets::AssetError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load reference data: {0}")]
    Reference(#[source] AssetError),
    #[error("failed to load field catalog: {0}")]
    Catalog(#[source] AssetError),
    #[error("failed to open pricing cache: {0}")]
    Store(#[from] StoreError),
    #[error("failed to configure {which} client: {source}")]
    Client {
        which: &'static str,
        #[source]
        source: SourceError,
    },
}

/// Every long-lived service, built once at startup.
pub struct App {
    pub config: Config,
    pub engine: Arc<EstimateEngine>,
    pub resolver: Arc<PricingResolver>,
    pub scheduler: Arc<RefreshScheduler>,
}

impl App {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let reference = match &config.reference_dir {
            Some(dir) => ReferenceData::from_dir(dir),
            None => ReferenceData::embedded(),
        }
        .map_err(AppError::Reference)?;
        let catalog = FieldCatalog::embedded().map_err(AppError::Catalog)?;

        let store = JsonFileStore::open(&config.cache_path).await?;
        info!(
            target: "cache",
            path = %store.path().display(),
            county_seats = reference.county_seats().len(),
            metros = reference.metros().len(),
            "pricing cache ready"
        );

        let timeout = config.request_timeout();
        let survey = BlsClient::new(&config.bls_base_url, timeout)
            .map_err(|source| AppError::Client { which: "labor survey", source })?
            .with_registration_key(config.bls_api_key.clone());
        let labor = LaborStrategyChain::new(Arc::new(survey), config.survey_year).with_timeout(timeout);

        let mut resolver = PricingResolver::new(Arc::new(reference), PricingCache::new(Arc::new(store)), labor)
            .with_expiry_days(config.cache_expiry_days)
            .with_request_timeout(timeout);
        if let Some(base) = &config.retail_base_url {
            let retail = RetailApiClient::new(base, timeout)
                .map_err(|source| AppError::Client { which: "retail", source })?;
            resolver = resolver.with_retail(Arc::new(retail));
        }
        let resolver = Arc::new(resolver);

        let scheduler = Arc::new(RefreshScheduler::new(Arc::clone(&resolver), config.scheduler()));
        let engine = Arc::new(
            EstimateEngine::new(Arc::new(catalog), Arc::clone(&resolver)).with_tax_rate(config.tax_rate),
        );

        Ok(Self {
            config,
            engine,
            resolver,
            scheduler,
        })
    }
}
