//! Occupational wage survey client (BLS public API v2, OEWS series).
//!
//! - Metro queries use the 7-digit MSA area code; the national variant uses
//!   the all-zero area.
//! - The hourly mean wage is the `03` data type of an OEWS series.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{base_url, check_status, SourceError};
use crate::util::version::user_agent;

pub const DEFAULT_BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/";

const HOURLY_MEAN_WAGE: &str = "03";
const ALL_INDUSTRIES: &str = "000000";
const NATIONAL_AREA: &str = "0000000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurveyArea {
    /// Metropolitan statistical area by its 7-digit code.
    Metro(String),
    National,
}

impl SurveyArea {
    /// OEWS series id for an occupation's hourly mean wage in this area.
    pub fn series_id(&self, occupation: &str) -> String {
        let soc: String = occupation.chars().filter(char::is_ascii_digit).collect();
        match self {
            SurveyArea::Metro(code) => format!("OEUM{code}{ALL_INDUSTRIES}{soc}{HOURLY_MEAN_WAGE}"),
            SurveyArea::National => {
                format!("OEUN{NATIONAL_AREA}{ALL_INDUSTRIES}{soc}{HOURLY_MEAN_WAGE}")
            }
        }
    }
}

/// Anything that can quote an hourly wage for an occupation.
#[async_trait]
pub trait LaborRateSource: Send + Sync {
    /// `Ok(None)` when the survey has no published figure.
    async fn hourly_rate(
        &self,
        occupation: &str,
        area: &SurveyArea,
        year: u16,
    ) -> Result<Option<f64>, SourceError>;
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
struct SeriesRequest<'a> {
    seriesid: [&'a str; 1],
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results", default)]
    results: Option<SeriesResults>,
}

#[derive(Debug, Deserialize)]
struct SeriesResults {
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    data: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    value: String,
}

#[derive(Clone)]
pub struct BlsClient {
    http: Client,
    base_url: Url,
    registration_key: Option<String>,
}

impl BlsClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = base_url(base)?;
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            registration_key: None,
        })
    }

    fn series_url(&self) -> Result<Url, SourceError> {
        Ok(self.base_url.join("timeseries/data/")?)
    }

    pub fn with_registration_key(mut self, key: Option<String>) -> Self {
        self.registration_key = key.filter(|key| !key.trim().is_empty());
        self
    }
}

#[async_trait]
impl LaborRateSource for BlsClient {
    async fn hourly_rate(
        &self,
        occupation: &str,
        area: &SurveyArea,
        year: u16,
    ) -> Result<Option<f64>, SourceError> {
        let url = self.series_url()?;
        let series_id = area.series_id(occupation);
        let body = SeriesRequest {
            seriesid: [series_id.as_str()],
            startyear: year.to_string(),
            endyear: year.to_string(),
            registrationkey: self.registration_key.as_deref(),
        };

        debug!(series = %series_id, year, "requesting wage series");
        let response = self.http.post(url).json(&body).send().await?;
        let payload: SeriesResponse = check_status(response).await?.json().await?;
        let rate = parse_series(payload)?;
        info!(series = %series_id, rate = ?rate, "wage series resolved");
        Ok(rate)
    }
}

fn parse_series(payload: SeriesResponse) -> Result<Option<f64>, SourceError> {
    if payload.status != "REQUEST_SUCCEEDED" {
        let message = if payload.message.is_empty() {
            payload.status
        } else {
            payload.message.join("; ")
        };
        return Err(SourceError::Api(message));
    }

    // Suppressed estimates come back as "-" or "*".
    Ok(payload
        .results
        .into_iter()
        .flat_map(|results| results.series)
        .flat_map(|series| series.data)
        .find_map(|observation| observation.value.trim().parse::<f64>().ok())
        .filter(|rate| rate.is_finite() && *rate > 0.0))
}
