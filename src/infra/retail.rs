//! Retail price search used to nudge material costs toward street prices.
//!
//! The endpoint is a plain JSON search API: `GET {base}/search?q=term`
//! answering `[{"name": ..., "price": ...}]`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{base_url, check_status, SourceError};
use crate::util::version::user_agent;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceCandidate {
    pub name: String,
    pub price: f64,
}

#[async_trait]
pub trait RetailPriceSource: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<PriceCandidate>, SourceError>;
}

#[derive(Clone)]
pub struct RetailApiClient {
    http: Client,
    base_url: Url,
}

impl RetailApiClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = base_url(base)?;
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    fn search_url(&self, term: &str) -> Result<Url, SourceError> {
        let mut url = self.base_url.join("search")?;
        url.query_pairs_mut().append_pair("q", term);
        Ok(url)
    }
}

#[async_trait]
impl RetailPriceSource for RetailApiClient {
    async fn search(&self, term: &str) -> Result<Vec<PriceCandidate>, SourceError> {
        let url = self.search_url(term)?;
        debug!(url = %url, "searching retail prices");
        let response = self.http.get(url).send().await?;
        let candidates: Vec<PriceCandidate> = check_status(response).await?.json().await?;
        let usable = usable_candidates(candidates);
        debug!(term, count = usable.len(), "retail candidates");
        Ok(usable)
    }
}

fn usable_candidates(candidates: Vec<PriceCandidate>) -> Vec<PriceCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.price.is_finite() && candidate.price > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_keeps_base_path() {
        let client = RetailApiClient::new("https://prices.example.com/v1", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.search_url("pex pipe 100 ft").unwrap().as_str(),
            "https://prices.example.com/v1/search?q=pex+pipe+100+ft"
        );
    }

    #[test]
    fn drops_unpriced_candidates() {
        let candidates: Vec<PriceCandidate> = serde_json::from_str(
            r#"[{"name": "a", "price": 12.5}, {"name": "b", "price": 0}, {"name": "c", "price": -3}]"#,
        )
        .unwrap();
        let usable = usable_candidates(candidates);
        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].name, "a");
    }
}
