//! Adapters for the outside world: labor survey, retail prices, cache storage.

pub mod labor;
pub mod retail;
pub mod store;

use reqwest::Url;
use thiserror::Error;

pub use labor::{BlsClient, LaborRateSource, SurveyArea};
pub use retail::{PriceCandidate, RetailApiClient, RetailPriceSource};
pub use store::{CacheStats, JsonFileStore, MemoryStore, PricingStore, ProfileFilter, StoreError};

/// Failure talking to an external data source. Always recovered by the
/// caller falling back to the next tier.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("api error: {0}")]
    Api(String),
}

/// Parses a configured API root. A trailing slash is added when missing so
/// `join` appends to the last path segment instead of replacing it.
pub(crate) fn base_url(base: &str) -> Result<Url, SourceError> {
    let base = base.trim();
    if base.ends_with('/') {
        Ok(Url::parse(base)?)
    } else {
        Ok(Url::parse(&format!("{base}/"))?)
    }
}

/// Turns a non-success response into [`SourceError::Server`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Server {
        status: status.as_u16(),
        body,
    })
}
