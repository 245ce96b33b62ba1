//! Trade cost estimating with regional pricing adjustments.
//!
//! [`EstimateEngine`] is the entry point for request handlers; [`App`]
//! builds it, together with the refresh scheduler, from a [`Config`].

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod pricing;
pub mod util;

pub use app::{App, AppError};
pub use config::{Config, ConfigError, ConfigOverrides};
pub use engine::{EstimateEngine, EstimateError, EstimateRequest, EstimateResponse};
