//! Runtime settings.
//!
//! Layering, lowest to highest precedence: built-in defaults, the JSON config
//! file, then command-line flags. Flags also read `ESTIMATOR_*` environment
//! variables (and a `.env` file, loaded by the binary before parsing).

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Args;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::infra::{labor, JsonFileStore};
use crate::pricing::{SchedulerConfig, DEFAULT_EXPIRY_DAYS};
use crate::util::persistence::{self, PersistLoadError, PersistSaveError};

pub const DEFAULT_SURVEY_YEAR: u16 = 2024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub cache_path: PathBuf,
    pub cache_expiry_days: u32,
    pub refresh_batch_size: usize,
    pub batch_delay_secs: u64,
    pub refresh_interval_hours: u64,
    pub cleanup_interval_hours: u64,
    pub request_timeout_secs: u64,
    pub bls_base_url: String,
    pub bls_api_key: Option<String>,
    pub survey_year: u16,
    /// Retail search endpoint. Material drift is skipped when unset.
    pub retail_base_url: Option<String>,
    pub tax_rate: f64,
    /// Directory holding `county_seats.json` and `metro_areas.json`; the
    /// embedded copies are used when unset.
    pub reference_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: JsonFileStore::default_path(),
            cache_expiry_days: DEFAULT_EXPIRY_DAYS,
            refresh_batch_size: 50,
            batch_delay_secs: 2,
            refresh_interval_hours: 7 * 24,
            cleanup_interval_hours: 24,
            request_timeout_secs: 10,
            bls_base_url: labor::DEFAULT_BASE_URL.to_string(),
            bls_api_key: None,
            survey_year: DEFAULT_SURVEY_YEAR,
            retail_base_url: None,
            tax_rate: crate::domain::estimate::DEFAULT_TAX_RATE,
            reference_dir: None,
        }
    }
}

/// Flag and environment overrides. Unset fields leave the file value alone.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Config file to read instead of the platform default.
    #[arg(long, global = true, env = "ESTIMATOR_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, env = "ESTIMATOR_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,
    #[arg(long, global = true, env = "ESTIMATOR_CACHE_EXPIRY_DAYS")]
    pub cache_expiry_days: Option<u32>,
    #[arg(long, global = true, env = "ESTIMATOR_BATCH_SIZE")]
    pub batch_size: Option<usize>,
    #[arg(long, global = true, env = "ESTIMATOR_BATCH_DELAY_SECS")]
    pub batch_delay_secs: Option<u64>,
    #[arg(long, global = true, env = "ESTIMATOR_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,
    #[arg(long, global = true, env = "ESTIMATOR_BLS_BASE_URL")]
    pub bls_base_url: Option<String>,
    #[arg(long, global = true, env = "ESTIMATOR_BLS_API_KEY", hide_env_values = true)]
    pub bls_api_key: Option<String>,
    #[arg(long, global = true, env = "ESTIMATOR_SURVEY_YEAR")]
    pub survey_year: Option<u16>,
    #[arg(long, global = true, env = "ESTIMATOR_RETAIL_BASE_URL")]
    pub retail_base_url: Option<String>,
    #[arg(long, global = true, env = "ESTIMATOR_TAX_RATE")]
    pub tax_rate: Option<f64>,
    #[arg(long, global = true, env = "ESTIMATOR_REFERENCE_DIR")]
    pub reference_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no platform config directory available")]
    NoConfigDir,
    #[error(transparent)]
    Load(#[from] PersistLoadError),
    #[error(transparent)]
    Save(#[from] PersistSaveError),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Config {
    /// Defaults, then the config file (if present), then `overrides`.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let path = match &overrides.config {
            Some(path) => Some(path.clone()),
            None => persistence::config_file(),
        };
        let base = match &path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// The file's settings over the defaults. A missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match persistence::load_json::<Self>(path)? {
            Some(config) => {
                debug!(path = %path.display(), "loaded config file");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Writes the settings to `path`, or the platform config file.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => persistence::config_file().ok_or(ConfigError::NoConfigDir)?,
        };
        persistence::save_json(&path, self)?;
        Ok(path)
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        let o = overrides.clone();
        if let Some(v) = o.cache_path {
            self.cache_path = v;
        }
        if let Some(v) = o.cache_expiry_days {
            self.cache_expiry_days = v;
        }
        if let Some(v) = o.batch_size {
            self.refresh_batch_size = v;
        }
        if let Some(v) = o.batch_delay_secs {
            self.batch_delay_secs = v;
        }
        if let Some(v) = o.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = o.bls_base_url {
            self.bls_base_url = v;
        }
        if o.bls_api_key.is_some() {
            self.bls_api_key = o.bls_api_key;
        }
        if let Some(v) = o.survey_year {
            self.survey_year = v;
        }
        if o.retail_base_url.is_some() {
            self.retail_base_url = o.retail_base_url;
        }
        if let Some(v) = o.tax_rate {
            self.tax_rate = v;
        }
        if o.reference_dir.is_some() {
            self.reference_dir = o.reference_dir;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if self.cache_expiry_days == 0 {
            return invalid("cacheExpiryDays", "must be at least 1");
        }
        if self.refresh_batch_size == 0 {
            return invalid("refreshBatchSize", "must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            return invalid("requestTimeoutSecs", "must be at least 1");
        }
        if self.refresh_interval_hours == 0 || self.cleanup_interval_hours == 0 {
            return invalid("intervals", "must be at least one hour");
        }
        if !(0.0..1.0).contains(&self.tax_rate) {
            return invalid("taxRate", "must be a fraction between 0 and 1");
        }
        if self.bls_base_url.trim().is_empty() {
            return invalid("blsBaseUrl", "must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_batch_size(self.refresh_batch_size)
            .with_batch_delay(Duration::from_secs(self.batch_delay_secs))
            .with_intervals(
                Duration::from_secs(self.refresh_interval_hours.saturating_mul(60 * 60)),
                Duration::from_secs(self.cleanup_interval_hours.saturating_mul(60 * 60)),
            )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_values_fill_in_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"refreshBatchSize": 20, "taxRate": 0.0625}"#).unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.refresh_batch_size, 20);
        assert_eq!(config.tax_rate, 0.0625);
        assert_eq!(config.cache_expiry_days, 14);
        assert_eq!(config.bls_base_url, labor::DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_beat_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"refreshBatchSize": 20, "surveyYear": 2022}"#).unwrap();

        let overrides = ConfigOverrides {
            config: Some(path),
            batch_size: Some(10),
            retail_base_url: Some("http://localhost:9000".into()),
            ..Default::default()
        };
        let config = Config::load(&overrides).unwrap();

        assert_eq!(config.refresh_batch_size, 10);
        assert_eq!(config.survey_year, 2022);
        assert_eq!(config.retail_base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let config = Config {
            bls_api_key: Some("key".into()),
            cache_expiry_days: 7,
            ..Config::default()
        };

        assert_eq!(config.save(Some(&path)).unwrap(), path);
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn rejects_nonsense_values() {
        let zero_batch = Config {
            refresh_batch_size: 0,
            ..Config::default()
        };
        assert!(matches!(
            zero_batch.validate(),
            Err(ConfigError::Invalid { field: "refreshBatchSize", .. })
        ));

        let percent_tax = Config {
            tax_rate: 8.0,
            ..Config::default()
        };
        assert!(percent_tax.validate().is_err());
    }

    #[test]
    fn scheduler_settings_follow_config() {
        let scheduler = Config::default().scheduler();
        assert_eq!(scheduler.batch_size, 50);
        assert_eq!(scheduler.batch_delay, Duration::from_secs(2));
        assert_eq!(scheduler.refresh_interval, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(scheduler.cleanup_interval, Duration::from_secs(24 * 3600));
    }
}
